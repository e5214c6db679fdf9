//! One-shot pipeline command.

use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use crate::store::MeetingStatus;
use anyhow::Result;

pub async fn process(settings: Settings, meeting_id: i64) -> Result<()> {
    let orchestrator = Orchestrator::new(settings)?;

    println!("Processing meeting {}...", meeting_id);
    orchestrator.process_meeting(meeting_id).await?;

    let meeting = orchestrator
        .store()
        .get_meeting(meeting_id)?
        .ok_or_else(|| anyhow::anyhow!("Meeting {} disappeared after processing", meeting_id))?;

    println!("Status: {}", meeting.status);
    if meeting.status == MeetingStatus::Done {
        if let Some(summary) = &meeting.summary {
            println!("\nSummary:\n{}", summary);
        }
        let items = orchestrator.store().action_items_for(meeting_id)?;
        if items.is_empty() {
            println!("\nNo action items.");
        } else {
            println!("\nAction items:");
            for item in items {
                let owner = item
                    .owner
                    .map(|o| format!(" ({})", o))
                    .unwrap_or_default();
                let due = item
                    .due_date
                    .map(|d| format!(" due {}", d.format("%Y-%m-%d")))
                    .unwrap_or_default();
                println!("  - {}{}{}", item.description, owner, due);
            }
        }
    }
    Ok(())
}
