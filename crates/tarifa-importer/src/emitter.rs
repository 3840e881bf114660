//! Post-commit entity-created notifications

use std::sync::Arc;
use tarifa_core::models::{
    BatchPlan, BatchStatement, EntityCreated, EventContext, GroupReport, WriteReport,
};
use tarifa_core::traits::EventPublisher;
use tracing::{debug, instrument, warn};

/// Separator between distinct statement texts of one event
pub const STATEMENT_SEPARATOR: &str = ";\n";

/// Publishes one event per table that received rows
///
/// Only called after commit. Publication failures are logged and never
/// affect the committed import.
#[derive(Clone)]
pub struct EventEmitter {
    publisher: Arc<dyn EventPublisher>,
}

impl EventEmitter {
    pub fn new(publisher: Arc<dyn EventPublisher>) -> Self {
        Self { publisher }
    }

    /// Returns the number of events published
    #[instrument(skip(self, plan, report), fields(rate_group_id = plan.rate_group_id))]
    pub async fn emit(&self, plan: &BatchPlan, report: &WriteReport) -> usize {
        let mut published = 0;

        for event in build_events(plan, report) {
            match self.publisher.publish(&event).await {
                Ok(()) => {
                    debug!("Published {} event", event.entity_type);
                    published += 1;
                }
                Err(e) => warn!("Failed to publish {} event: {}", event.entity_type, e),
            }
        }

        published
    }
}

/// Events of a committed plan, in group order
pub fn build_events(plan: &BatchPlan, report: &WriteReport) -> Vec<EntityCreated> {
    report
        .groups
        .iter()
        .filter(|g| g.affected_rows > 0)
        .filter_map(|g| {
            let batch = plan.group(g.group)?;
            let statements = affecting_statements(&batch.statements, g);
            Some(EntityCreated::bulk(g.group.entity_type(), context(&statements)))
        })
        .collect()
}

fn affecting_statements<'a>(
    statements: &'a [BatchStatement],
    report: &GroupReport,
) -> Vec<&'a BatchStatement> {
    statements
        .iter()
        .zip(report.chunk_affected.iter())
        .filter(|(_, affected)| **affected > 0)
        .map(|(statement, _)| statement)
        .collect()
}

fn context(statements: &[&BatchStatement]) -> EventContext {
    let mut texts: Vec<&str> = Vec::new();
    for statement in statements {
        if !texts.contains(&statement.sql.as_str()) {
            texts.push(statement.sql.as_str());
        }
    }

    EventContext {
        statement_text: texts.join(STATEMENT_SEPARATOR),
        arguments: statements.iter().map(|s| s.arguments()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tarifa_core::models::{GroupBatch, SqlParam, StatementGroup};
    use tarifa_core::{AppError, AppResult};

    struct MockEventPublisher {
        events: Mutex<Vec<EntityCreated>>,
        fail: bool,
    }

    #[async_trait]
    impl EventPublisher for MockEventPublisher {
        async fn publish(&self, event: &EntityCreated) -> AppResult<()> {
            if self.fail {
                return Err(AppError::Publish("unavailable".to_string()));
            }
            self.events.lock().unwrap().push(event.clone());
            Ok(())
        }
    }

    fn statement(group: StatementGroup, sql: &str, value: i32) -> BatchStatement {
        BatchStatement {
            group,
            sql: sql.to_string(),
            params: vec![SqlParam::Int(value)],
            row_count: 1,
        }
    }

    fn plan() -> BatchPlan {
        BatchPlan {
            brand_id: 7,
            rate_group_id: 5,
            groups: vec![
                GroupBatch {
                    group: StatementGroup::Destinations,
                    statements: vec![
                        statement(StatementGroup::Destinations, "INSERT A", 1),
                        statement(StatementGroup::Destinations, "INSERT A", 2),
                        statement(StatementGroup::Destinations, "INSERT B", 3),
                    ],
                },
                GroupBatch {
                    group: StatementGroup::TariffDestinations,
                    statements: vec![statement(StatementGroup::TariffDestinations, "INSERT C", 4)],
                },
            ],
        }
    }

    fn report(destinations: Vec<u64>, mappings: Vec<u64>) -> WriteReport {
        WriteReport {
            groups: vec![
                GroupReport {
                    group: StatementGroup::Destinations,
                    affected_rows: destinations.iter().sum(),
                    chunk_affected: destinations,
                },
                GroupReport {
                    group: StatementGroup::TariffDestinations,
                    affected_rows: mappings.iter().sum(),
                    chunk_affected: mappings,
                },
            ],
        }
    }

    #[test]
    fn test_one_event_per_affected_group() {
        let events = build_events(&plan(), &report(vec![1, 1, 1], vec![0]));

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].entity_type, "Destination");
        assert_eq!(events[0].bulk_marker_id, 0);
        assert_eq!(events[0].context.statement_text, "INSERT A;\nINSERT B");
        assert_eq!(events[0].context.arguments.len(), 3);
    }

    #[test]
    fn test_context_only_holds_affecting_chunks() {
        let events = build_events(&plan(), &report(vec![0, 2, 0], vec![1]));

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].context.statement_text, "INSERT A");
        assert_eq!(events[0].context.arguments, vec![serde_json::json!([2])]);
        assert_eq!(events[1].entity_type, "TpDestination");
    }

    #[test]
    fn test_no_events_when_nothing_changed() {
        assert!(build_events(&plan(), &report(vec![0, 0, 0], vec![0])).is_empty());
    }

    #[tokio::test]
    async fn test_publish_failures_are_swallowed() {
        let publisher = Arc::new(MockEventPublisher {
            events: Mutex::new(vec![]),
            fail: true,
        });
        let emitter = EventEmitter::new(publisher.clone());

        let published = emitter.emit(&plan(), &report(vec![1, 0, 0], vec![1])).await;
        assert_eq!(published, 0);
        assert!(publisher.events.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_emit_publishes_events() {
        let publisher = Arc::new(MockEventPublisher {
            events: Mutex::new(vec![]),
            fail: false,
        });
        let emitter = EventEmitter::new(publisher.clone());

        let published = emitter.emit(&plan(), &report(vec![1, 0, 0], vec![1])).await;
        assert_eq!(published, 2);
        assert_eq!(publisher.events.lock().unwrap().len(), 2);
    }
}
