//! Proctored session simulator
//!
//! Seeds an in-memory bank and record store, opens a synthetic camera,
//! and drives one complete assessment session end to end: answer every
//! question, glance away briefly mid-run, then submit. Configuration is
//! layered from an optional `proctor-sim.toml` and `PROCTOR_*`
//! environment variables.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use tokio::sync::watch;
use tracing::info;

use camera_capture::{SyntheticCamera, SyntheticScene};
use presence::PageVisibility;
use proctor_session::{AssessmentSession, SessionConfig, SessionContext};
use question_bank::{Assessment, InMemoryBank, Question};
use record_store::{ApplicationRecord, ApplicationStore, InMemoryRecordStore};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct SimConfig {
    job_id: String,
    candidate: String,
    questions: usize,
    session: SessionConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            job_id: "job-demo".into(),
            candidate: "candidate@example.com".into(),
            questions: 10,
            session: SessionConfig::default(),
        }
    }
}

fn load_config() -> Result<SimConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("proctor-sim").required(false))
        .add_source(config::Environment::with_prefix("PROCTOR").separator("__"))
        .build()
        .context("loading configuration")?;
    settings
        .try_deserialize()
        .context("parsing configuration")
}

fn seed_bank(cfg: &SimConfig) -> Result<InMemoryBank> {
    let questions = (0..cfg.questions)
        .map(|i| {
            let answer = i + i;
            let options = (0..4).map(|o| (answer + o).to_string()).collect();
            Question::new(format!("What is {i} + {i}?"), options, answer.to_string())
        })
        .collect::<Result<Vec<_>, _>>()
        .context("building question set")?;

    let bank = InMemoryBank::new();
    bank.insert(Assessment::new(cfg.job_id.clone(), questions)?)?;
    Ok(bank)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cfg = load_config()?;
    info!(job_id = %cfg.job_id, questions = cfg.questions, "starting simulation");

    let bank = seed_bank(&cfg)?;
    let store = Arc::new(InMemoryRecordStore::new());
    store.upsert(ApplicationRecord::selected(&cfg.job_id, &cfg.candidate))?;
    let mut record_events = store.subscribe();

    let camera = SyntheticCamera::new(SyntheticScene::Candidate);
    let scene = camera.scene_handle();
    let (_visibility_tx, visibility_rx) = watch::channel(PageVisibility::Visible);

    let (handle, session) = AssessmentSession::begin(
        SessionContext {
            job_id: cfg.job_id.clone(),
            candidate: cfg.candidate.clone(),
        },
        &bank,
        Arc::clone(&store) as Arc<dyn ApplicationStore>,
        Box::new(camera),
        visibility_rx,
        cfg.session.clone(),
    )
    .await
    .context("session setup failed")?;

    let run = tokio::spawn(session.run());

    for index in 0..cfg.questions {
        let choice = handle
            .question(index)
            .and_then(|q| q.options().first().cloned())
            .context("question missing")?;
        handle.select_answer(choice).await;

        if index + 1 < cfg.questions {
            handle.next().await;
        }

        // Glance away briefly mid-assessment; well inside the grace
        // window, so the session keeps running.
        if index == cfg.questions / 2 {
            if let Ok(mut scene) = scene.lock() {
                *scene = SyntheticScene::Empty;
            }
            tokio::time::sleep(Duration::from_millis(600)).await;
            if let Ok(mut scene) = scene.lock() {
                *scene = SyntheticScene::Candidate;
            }
        }
    }

    let view = handle.view();
    info!(
        answered = view.answered,
        remaining_secs = view.remaining.as_secs(),
        "submitting"
    );
    handle.submit().await;

    let outcome = run.await?.map_err(|e| anyhow::anyhow!(e))?;
    info!(
        score = outcome.score,
        reason = outcome.reason.as_str(),
        "session terminated"
    );

    let event = record_events.recv().await?;
    info!(status = ?event.status, score = ?event.score, "record store notified");

    Ok(())
}
