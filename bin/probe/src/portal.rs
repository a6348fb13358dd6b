//! The buyer portal route table.

use b2b_storefront_access::{CompanyStatus, Role, Route, RouteDescriptor};

/// Name of the view the storefront renders for a route.
pub type ViewName = &'static str;

/// Portal routes in menu order.
#[must_use]
pub fn portal_routes() -> Vec<Route<ViewName>> {
    vec![
        Route::new(RouteDescriptor::new("/login").named("Sign in"), "Login"),
        Route::new(
            RouteDescriptor::new("/register").named("Register"),
            "Registration",
        ),
        Route::new(
            RouteDescriptor::new("/dashboard")
                .named("Dashboard")
                .menu_item()
                .role(Role::SuperAdmin),
            "Dashboard",
        ),
        Route::new(
            RouteDescriptor::new("/orders")
                .named("My orders")
                .menu_item()
                .permissions(["orders"]),
            "Orders",
        ),
        Route::new(
            RouteDescriptor::new("/company-orders")
                .named("Company orders")
                .menu_item()
                .statuses([CompanyStatus::Approved])
                .permissions(["orders"]),
            "CompanyOrders",
        ),
        Route::new(
            RouteDescriptor::new("/quotes")
                .named("Quotes")
                .menu_item()
                .permissions(["quotes"]),
            "QuotesList",
        ),
        Route::new(
            RouteDescriptor::new("/shopping-lists")
                .named("Shopping lists")
                .menu_item()
                .statuses([CompanyStatus::Approved])
                .permissions(["shopping_lists"]),
            "ShoppingLists",
        ),
        Route::new(
            RouteDescriptor::new("/quick-order")
                .named("Quick order")
                .menu_item()
                .permissions(["quick_order"]),
            "QuickOrder",
        ),
        Route::new(
            RouteDescriptor::new("/invoices")
                .named("Invoices")
                .menu_item()
                .statuses([CompanyStatus::Approved])
                .permissions(["invoices"]),
            "Invoices",
        ),
        Route::new(
            RouteDescriptor::new("/user-management")
                .named("User management")
                .menu_item()
                .role(Role::Admin)
                .statuses([CompanyStatus::Approved]),
            "UserManagement",
        ),
        Route::new(
            RouteDescriptor::new("/addresses")
                .named("Addresses")
                .menu_item()
                .permissions(["addresses"]),
            "Addresses",
        ),
        Route::new(
            RouteDescriptor::new("/account-settings")
                .named("Account settings")
                .menu_item()
                .authenticated(),
            "AccountSettings",
        ),
    ]
}
