use std::sync::{Arc, RwLock};

/// Shared credential slot read by every authenticated request.
///
/// Clones share the same slot. Each `Gateway::new()` is isolated, so tests
/// and multiple accounts never see each other's tokens.
#[derive(Clone, Default)]
pub struct Gateway {
    slot: Arc<RwLock<Option<String>>>,
}

impl Gateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the attached credential. Requests sent afterwards use the new value.
    pub fn set_credential(&self, token: Option<String>) {
        let mut slot = self.slot.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        *slot = token;
    }

    pub fn current_credential(&self) -> Option<String> {
        self.slot
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn has_credential(&self) -> bool {
        self.slot
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .is_some()
    }
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print the token itself
        f.debug_struct("Gateway")
            .field("attached", &self.has_credential())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_clear_credential() {
        let gateway = Gateway::new();
        assert_eq!(gateway.current_credential(), None);

        gateway.set_credential(Some("tok-1".to_string()));
        assert_eq!(gateway.current_credential().as_deref(), Some("tok-1"));

        gateway.set_credential(Some("tok-2".to_string()));
        assert_eq!(gateway.current_credential().as_deref(), Some("tok-2"));

        gateway.set_credential(None);
        assert!(!gateway.has_credential());
    }

    #[test]
    fn test_clones_share_slot_but_instances_are_isolated() {
        let a = Gateway::new();
        let a_clone = a.clone();
        let b = Gateway::new();

        a.set_credential(Some("shared".to_string()));
        assert_eq!(a_clone.current_credential().as_deref(), Some("shared"));
        assert_eq!(b.current_credential(), None);
    }

    #[test]
    fn test_debug_hides_token() {
        let gateway = Gateway::new();
        gateway.set_credential(Some("secret-token".to_string()));
        let printed = format!("{:?}", gateway);
        assert!(!printed.contains("secret-token"));
        assert!(printed.contains("attached: true"));
    }
}
