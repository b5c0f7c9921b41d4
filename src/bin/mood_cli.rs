use anyhow::Result;
use moodbot::{
    catalog,
    config::ServerConfig,
    engine::{MoodEngine, Outcome, RequestState},
    inference,
    reply::{Reply, PROMPT_FOR_INPUT},
};
use std::env;

fn main() -> Result<()> {
    let config = ServerConfig::from_env();

    let text = env::args().skip(1).collect::<Vec<_>>().join(" ");

    let (labels, templates) =
        catalog::load(config.catalog_path.as_deref(), config.templates_path.as_deref())?;
    let engine = MoodEngine::new(labels, templates);
    let classifier =
        inference::load_classifier(&config.model_dir, config.device.as_deref(), config.seq_len);

    match engine.process(classifier.as_ref(), Some(text.as_str()), config.reply_mode) {
        RequestState::AwaitingText => println!("{PROMPT_FOR_INPUT}"),
        RequestState::Resolved(Outcome::Reply(Reply::Text(reply))) => println!("{reply}"),
        RequestState::Resolved(Outcome::Reply(Reply::Emotions(names))) => {
            println!("{}", serde_json::to_string(&names)?)
        }
        RequestState::Resolved(Outcome::Reply(Reply::Json(detailed))) => {
            println!("{}", serde_json::to_string_pretty(&detailed)?)
        }
        RequestState::Resolved(Outcome::Failed(diagnostic)) => {
            eprintln!("Sorry, something went wrong: {diagnostic}");
            std::process::exit(1);
        }
    }

    Ok(())
}
