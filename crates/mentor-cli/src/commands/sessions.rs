use anyhow::Result;
use colored::Colorize;
use mentor_core::config::MentorConfig;
use mentor_core::session::SessionRepository;
use mentor_infrastructure::TomlSessionRepository;

pub async fn list(config: &MentorConfig) -> Result<()> {
    let repository = TomlSessionRepository::from_config(&config.storage)?;
    let sessions = repository.list_all().await?;
    if sessions.is_empty() {
        println!("{}", "No stored sessions.".bright_black());
        return Ok(());
    }

    for session in sessions {
        let opening = session
            .turns
            .first()
            .map(|t| t.text.chars().take(48).collect::<String>())
            .unwrap_or_default();
        println!(
            "{}  {}  {:<12} {:>3} turns  {}",
            session.id.bright_cyan(),
            session.updated_at.format("%Y-%m-%d %H:%M"),
            session.phase.current_phase().to_string(),
            session.learner_turn_count(),
            opening.bright_black()
        );
    }
    Ok(())
}

pub async fn delete(config: &MentorConfig, id: &str) -> Result<()> {
    let repository = TomlSessionRepository::from_config(&config.storage)?;
    if repository.find_by_id(id).await.ok().flatten().is_none() {
        println!("{}", format!("No readable session {id}; removing any leftover file.").yellow());
    }
    repository.delete(id).await?;
    tracing::info!(session_id = id, "Session deleted");
    println!("{}", format!("Deleted session {id}").bright_green());
    Ok(())
}
