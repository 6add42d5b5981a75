//! Entities stuck in the `unavailable` state.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use glob_match::glob_match;
use homewatch_traits::{EntityState, NotificationPriority};

use super::ActionContext;
use super::format::relative_time;
use crate::models::{Task, TaskReport};

const UNAVAILABLE: &str = "unavailable";

fn matches_any(patterns: &[String], entity_id: &str) -> bool {
    patterns.iter().any(|pattern| glob_match(pattern, entity_id))
}

/// Included patterns narrow the scan only when present.
fn is_watched(task: &Task, entity_id: &str) -> bool {
    let included = task.entities_to_always_report.is_empty()
        || matches_any(&task.entities_to_always_report, entity_id);
    included && !matches_any(&task.entities_to_exclude, entity_id)
}

pub fn unavailable_entities(states: &[EntityState], task: &Task, now: DateTime<Utc>) -> Vec<String> {
    states
        .iter()
        .filter(|entity| entity.state == UNAVAILABLE && is_watched(task, &entity.entity_id))
        .map(|entity| {
            let name = if entity.display_name() == entity.entity_id {
                entity.entity_id.clone()
            } else {
                format!("{} ({})", entity.display_name(), entity.entity_id)
            };
            match entity.last_changed {
                Some(changed) => format!("- {} since {}", name, relative_time(now, changed)),
                None => format!("- {}", name),
            }
        })
        .collect()
}

pub async fn run(ctx: &ActionContext<'_>) -> Result<TaskReport> {
    let states = ctx
        .collaborators
        .home_assistant
        .get_all_entity_states()
        .await
        .context("Failed to fetch entity states")?;

    let lines = unavailable_entities(&states, ctx.task, Utc::now());
    if lines.is_empty() {
        return Ok(TaskReport::silent());
    }

    Ok(
        TaskReport::new(format!("Unavailable entities:\n{}", lines.join("\n")))
            .with_priority(NotificationPriority::High),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaskType;
    use crate::testkit::TestHarness;
    use chrono::Duration;

    fn task(include: &[&str], exclude: &[&str]) -> Task {
        let mut task = Task::new("Unavailable").with_type(TaskType::ReportHaUnavailableEntities);
        task.entities_to_always_report = include.iter().map(|p| p.to_string()).collect();
        task.entities_to_exclude = exclude.iter().map(|p| p.to_string()).collect();
        task
    }

    fn states(now: DateTime<Utc>) -> Vec<EntityState> {
        let mut plug = EntityState::new("switch.plug", "unavailable")
            .with_attribute("friendly_name", "Desk plug");
        plug.last_changed = Some(now - Duration::hours(3));
        vec![
            plug,
            EntityState::new("sensor.outdoor_temp", "unavailable"),
            EntityState::new("sensor.indoor_temp", "21.5"),
            EntityState::new("sensor.phone_battery", "unavailable"),
        ]
    }

    #[test]
    fn test_all_unavailable_without_patterns() {
        let now = Utc::now();
        let lines = unavailable_entities(&states(now), &task(&[], &[]), now);
        assert_eq!(
            lines,
            vec![
                "- Desk plug (switch.plug) since 3 hours ago",
                "- sensor.outdoor_temp",
                "- sensor.phone_battery",
            ]
        );
    }

    #[test]
    fn test_include_and_exclude_patterns() {
        let now = Utc::now();
        let lines = unavailable_entities(
            &states(now),
            &task(&["sensor.*"], &["sensor.*_battery"]),
            now,
        );
        assert_eq!(lines, vec!["- sensor.outdoor_temp"]);
    }

    #[tokio::test]
    async fn test_none_unavailable_force_stops() {
        let harness = TestHarness::new();
        harness
            .home_assistant
            .set_states(vec![EntityState::new("sensor.indoor_temp", "21.5")])
            .await;

        let report = run(&harness.context(&task(&[], &[]))).await.unwrap();
        assert!(report.force_stop);
    }

    #[tokio::test]
    async fn test_unavailable_raises_priority() {
        let harness = TestHarness::new();
        harness.home_assistant.set_states(states(Utc::now())).await;

        let report = run(&harness.context(&task(&["switch.*"], &[]))).await.unwrap();
        assert!(report.message.starts_with("Unavailable entities:\n- Desk plug"));
        assert_eq!(report.priority, Some(NotificationPriority::High));
    }
}
