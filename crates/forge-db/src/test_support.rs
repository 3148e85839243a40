//! Shared test utilities for forge-db unit tests.

pub(crate) mod helpers {
    use forge_core::entities::{CardSpecification, DeckFields, OriginalCard, ThemeConfiguration};
    use forge_core::enums::DeckStatus;
    use tracing_subscriber::EnvFilter;

    use crate::service::ForgeService;

    /// Install a test-writer subscriber filtered by `PROXYFORGE_LOG` (default `warn`).
    pub fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_env("PROXYFORGE_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    }

    /// In-memory service with the built-in migrations applied.
    pub async fn test_service() -> ForgeService {
        init_tracing();
        ForgeService::new_local(":memory:").await.unwrap()
    }

    pub fn theme() -> ThemeConfiguration {
        ThemeConfiguration {
            name: "Star Wars".into(),
            description: "A galaxy far, far away".into(),
            keywords: vec!["jedi".into(), "sith".into()],
            style: None,
            mood: Some("heroic".into()),
            specifics: vec![CardSpecification {
                card_name: "Lightning Bolt".into(),
                thematic_reference: "Force Lightning".into(),
            }],
        }
    }

    pub fn deck_fields(name: &str) -> DeckFields {
        DeckFields {
            user_id: "user_1".into(),
            name: name.into(),
            theme: theme(),
            status: DeckStatus::Draft,
            is_public: false,
        }
    }

    pub fn bolt() -> OriginalCard {
        OriginalCard {
            id: "e3285e6b".into(),
            name: "Lightning Bolt".into(),
            oracle_id: "4457ed35".into(),
            type_line: "Instant".into(),
            oracle_text: "Lightning Bolt deals 3 damage to any target.".into(),
            mana_cost: Some("{R}".into()),
            power: None,
            toughness: None,
            loyalty: None,
        }
    }
}
