//! Feature flags derived from the current session.
//!
//! The store configures a base set of flags. For company accounts, the
//! quote and shopping-list flags are additionally gated on the user's
//! granted permission codes. The derivation is pure, so recomputing it for
//! an unchanged session is harmless.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

use crate::permission::has_any_of;
use crate::session::AuthSession;
use crate::store::{SessionStore, Subscription};

/// Codes that enable quote creation.
pub const QUOTE_CREATE_CODES: [&str; 2] = ["quotes_create", "quotesCreateActions"];

/// Codes that enable shopping list creation.
pub const SHOPPING_LIST_CREATE_CODES: [&str; 2] =
    ["shopping_list_create", "shoppingListCreateActions"];

/// Storefront feature toggles.
///
/// Serialized in camelCase for the UI. Configuration sources may use
/// either camelCase or snake_case keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FeatureFlagSet {
    #[serde(alias = "product_quote_enabled")]
    pub product_quote_enabled: bool,
    #[serde(alias = "cart_quote_enabled")]
    pub cart_quote_enabled: bool,
    #[serde(alias = "shopping_list_enabled")]
    pub shopping_list_enabled: bool,
    #[serde(alias = "register_enabled")]
    pub register_enabled: bool,
}

impl Default for FeatureFlagSet {
    fn default() -> Self {
        Self {
            product_quote_enabled: true,
            cart_quote_enabled: true,
            shopping_list_enabled: true,
            register_enabled: true,
        }
    }
}

/// Flags published to the UI after every session change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UiFlags {
    #[serde(flatten)]
    pub flags: FeatureFlagSet,
    /// A super admin is acting on behalf of a company.
    pub is_agenting: bool,
    /// The session belongs to a company account.
    pub is_company_account: bool,
}

/// Gates `base` on `granted_codes` for company accounts.
#[must_use]
pub fn derive_flags<S: AsRef<str>>(
    base: &FeatureFlagSet,
    is_b2b_user: bool,
    granted_codes: &[S],
) -> FeatureFlagSet {
    if !is_b2b_user {
        return *base;
    }

    let can_quote = has_any_of(granted_codes, &QUOTE_CREATE_CODES);
    let can_list = has_any_of(granted_codes, &SHOPPING_LIST_CREATE_CODES);
    FeatureFlagSet {
        product_quote_enabled: base.product_quote_enabled && can_quote,
        cart_quote_enabled: base.cart_quote_enabled && can_quote,
        shopping_list_enabled: base.shopping_list_enabled && can_list,
        register_enabled: base.register_enabled,
    }
}

/// Computes the UI flags for `session`. No session passes `base` through.
#[must_use]
pub fn derive_ui_flags(base: &FeatureFlagSet, session: Option<&AuthSession>) -> UiFlags {
    match session {
        Some(session) => UiFlags {
            flags: derive_flags(
                base,
                session.is_b2b_user(),
                &session.permissions().granted_codes(),
            ),
            is_agenting: session.is_masquerading(),
            is_company_account: session.is_b2b_user(),
        },
        None => UiFlags {
            flags: *base,
            is_agenting: false,
            is_company_account: false,
        },
    }
}

/// Keeps UI flags in step with the store.
///
/// Publishes into a `watch` channel once per session change; state
/// transitions that leave the session untouched (such as `is_loading`
/// toggling) publish nothing.
pub struct FeatureFlagDeriver {
    flags: Arc<watch::Sender<UiFlags>>,
    _subscription: Subscription,
}

impl FeatureFlagDeriver {
    /// Subscribes to `store` and publishes the initial flags immediately.
    #[must_use]
    pub fn attach(store: &SessionStore, base: FeatureFlagSet) -> Self {
        let (sender, _) = watch::channel(derive_ui_flags(&base, None));
        let flags = Arc::new(sender);
        let publisher = Arc::clone(&flags);
        let last_session: Arc<Mutex<Option<Option<AuthSession>>>> = Arc::new(Mutex::new(None));

        let subscription = store.subscribe(move |state| {
            let session = state.session();
            {
                let mut last = last_session.lock();
                if last.as_ref().is_some_and(|seen| seen.as_ref() == session) {
                    return;
                }
                *last = Some(session.cloned());
            }

            let derived = derive_ui_flags(&base, session);
            debug!(?derived, "feature flags derived");
            publisher.send_replace(derived);
        });

        Self {
            flags,
            _subscription: subscription,
        }
    }

    /// Latest published flags.
    #[must_use]
    pub fn current(&self) -> UiFlags {
        *self.flags.borrow()
    }

    /// Receiver that observes every publication.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<UiFlags> {
        self.flags.subscribe()
    }
}
