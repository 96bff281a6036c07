//! Tracks whether the control channel sits on a page that can host the relay.

use harness_core_types::is_content_url;
use serde::Serialize;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum Readiness {
    #[default]
    Uninitialized,
    Ready {
        url: String,
    },
    Invalidated {
        url: String,
    },
}

/// Inputs that drive [`Readiness::transition`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReadinessSignal {
    /// `init()` located a content page and the relay answered.
    Initialized { url: String },
    /// A guard observed the current location.
    LocationChecked { url: String },
    /// An operation deliberately left content pages.
    NavigatedAway { url: String },
}

impl Readiness {
    pub fn transition(&self, signal: &ReadinessSignal) -> Readiness {
        match (self, signal) {
            (_, ReadinessSignal::Initialized { url }) => Readiness::Ready { url: url.clone() },
            (Readiness::Ready { .. }, ReadinessSignal::LocationChecked { url }) => {
                if is_content_url(url) {
                    Readiness::Ready { url: url.clone() }
                } else {
                    Readiness::Invalidated { url: url.clone() }
                }
            }
            (Readiness::Ready { .. }, ReadinessSignal::NavigatedAway { url })
            | (Readiness::Invalidated { .. }, ReadinessSignal::NavigatedAway { url }) => {
                Readiness::Invalidated { url: url.clone() }
            }
            // Only init() recovers an invalidated channel, and an uninitialized
            // one initializes lazily on the next guard.
            (Readiness::Invalidated { .. }, ReadinessSignal::LocationChecked { .. })
            | (Readiness::Uninitialized, _) => self.clone(),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Readiness::Ready { .. })
    }

    pub fn location(&self) -> Option<&str> {
        match self {
            Readiness::Uninitialized => None,
            Readiness::Ready { url } | Readiness::Invalidated { url } => Some(url),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Readiness::Uninitialized => "uninitialized",
            Readiness::Ready { .. } => "ready",
            Readiness::Invalidated { .. } => "invalidated",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONTENT: &str = "http://localhost:8000/";
    const PRIVILEGED: &str = "about:debugging#/runtime/this-firefox";

    fn ready() -> Readiness {
        Readiness::Ready {
            url: CONTENT.into(),
        }
    }

    fn checked(url: &str) -> ReadinessSignal {
        ReadinessSignal::LocationChecked { url: url.into() }
    }

    #[test]
    fn init_from_any_state_is_ready() {
        let signal = ReadinessSignal::Initialized {
            url: CONTENT.into(),
        };
        for state in [
            Readiness::Uninitialized,
            ready(),
            Readiness::Invalidated {
                url: PRIVILEGED.into(),
            },
        ] {
            assert_eq!(state.transition(&signal), ready());
        }
    }

    #[test]
    fn content_check_keeps_ready() {
        let next = ready().transition(&checked("https://example.com/page"));
        assert!(next.is_ready());
        assert_eq!(next.location(), Some("https://example.com/page"));
    }

    #[test]
    fn non_content_check_invalidates() {
        let next = ready().transition(&checked("about:blank"));
        assert_eq!(
            next,
            Readiness::Invalidated {
                url: "about:blank".into()
            }
        );
        assert!(!next.is_ready());
    }

    #[test]
    fn invalidated_never_recovers_from_a_check() {
        let state = Readiness::Invalidated {
            url: PRIVILEGED.into(),
        };
        assert_eq!(state.transition(&checked(CONTENT)), state);
    }

    #[test]
    fn navigating_away_invalidates() {
        let signal = ReadinessSignal::NavigatedAway {
            url: PRIVILEGED.into(),
        };
        assert_eq!(ready().transition(&signal).name(), "invalidated");
        assert_eq!(Readiness::Uninitialized.transition(&signal).name(), "uninitialized");
    }

    #[test]
    fn uninitialized_ignores_checks() {
        assert_eq!(
            Readiness::Uninitialized.transition(&checked(CONTENT)),
            Readiness::Uninitialized
        );
    }
}
