//! # Interview Engine
//!
//! Orchestrates the full observation run: for every discovered tool,
//! generate a probe battery, run the persona-filtered cases through a
//! bounded worker pool, aggregate the samples into fingerprints, and hand a
//! single consistent snapshot to baseline synthesis.
//!
//! ## Scheduling
//!
//! - At most `parallel_tools` tools are in flight across the engine and at
//!   most `max_parallel_per_tool` cases per tool; tools annotated
//!   non-idempotent are probed strictly sequentially.
//! - Every call carries a deadline; every tool has a total-time budget; the
//!   interview has a hard global stop. A deadline that fires finalizes the
//!   affected scope with whatever samples completed and marks it partial.
//!
//! ## Failure semantics
//!
//! Per-call transport failures become error samples. A fatal session
//! failure trips the abort flag: outstanding calls wind down, untouched
//! tools are recorded bare, and the run synthesizes as partial. Panics in
//! the generator or the fingerprinter are trapped per tool; siblings
//! proceed.

use crate::assess::AssessmentTally;
use crate::config::InterviewConfig;
use crate::personas::{resolve, Persona};
use crate::probe_hook::SecurityProbe;
use crate::progress::{InterviewPhase, ProgressReporter};
use bellwether_baseline::{
    PromptDescriptor, ResourceDescriptor, ResourceTemplateDescriptor, ServerInfo, ToolDescriptor,
    ToolRecord,
};
use bellwether_fingerprint::{
    cluster_errors, infer_from_samples, PerformanceMetrics, ResponseFingerprint, Sample,
    SchemaEvolution,
};
use bellwether_probe::{fallback_cases, generate_cases, TestCase};
use bellwether_transport::{DiscoveryResult, Session};
use chrono::Utc;
use serde_json::{json, Value};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Everything one interview run observed, before baseline assembly.
#[derive(Debug, Clone)]
pub struct InterviewResult {
    pub run_id: String,
    pub server: ServerInfo,
    pub tools: Vec<ToolRecord>,
    pub prompts: Vec<PromptDescriptor>,
    pub resources: Vec<ResourceDescriptor>,
    pub resource_templates: Vec<ResourceTemplateDescriptor>,
    pub personas: Vec<String>,
    pub warnings: Vec<String>,
    pub partial: bool,
    pub duration_ms: u64,
}

/// The interview orchestrator.
pub struct InterviewEngine {
    config: InterviewConfig,
    progress: ProgressReporter,
    security_probe: Option<Arc<dyn SecurityProbe>>,
}

impl InterviewEngine {
    pub fn new(config: InterviewConfig) -> Self {
        Self {
            config,
            progress: ProgressReporter::disabled(),
            security_probe: None,
        }
    }

    /// Attaches a progress reporter.
    pub fn with_progress(mut self, progress: ProgressReporter) -> Self {
        self.progress = progress;
        self
    }

    /// Attaches an external security probe that runs after the core
    /// interview.
    pub fn with_security_probe(mut self, probe: Arc<dyn SecurityProbe>) -> Self {
        self.security_probe = Some(probe);
        self
    }

    /// Runs the interview against a live session.
    ///
    /// A session that dies mid-run (or a global deadline that fires) still
    /// yields a result synthesized from the collected samples, flagged
    /// partial, unless `graceful_partial` is disabled, in which case the
    /// abort surfaces as an error.
    pub async fn interview(
        &self,
        session: Arc<dyn Session>,
        discovery: DiscoveryResult,
    ) -> crate::error::Result<InterviewResult> {
        let started = Instant::now();
        let run_id = Uuid::new_v4().to_string();
        self.progress.phase(InterviewPhase::Starting);

        let personas = resolve(&self.config.personas);
        let persona_ids: Vec<String> = personas.iter().map(|p| p.id.clone()).collect();
        let aborted = Arc::new(AtomicBool::new(false));
        let mut warnings = discovery.warnings.clone();

        info!(
            run_id = %run_id,
            tools = discovery.tools.len(),
            personas = persona_ids.len(),
            "interview starting"
        );
        self.progress.phase(InterviewPhase::Interviewing);

        let total = discovery.tools.len();
        let pool = Arc::new(Semaphore::new(self.config.parallel_tools.max(1)));
        let mut tasks: JoinSet<(usize, ToolRecord, Vec<String>)> = JoinSet::new();

        for (index, tool) in discovery.tools.iter().cloned().enumerate() {
            let session = Arc::clone(&session);
            let config = self.config.clone();
            let personas = personas.clone();
            let pool = Arc::clone(&pool);
            let aborted = Arc::clone(&aborted);
            tasks.spawn(async move {
                let _permit = pool.acquire_owned().await.expect("worker pool closed");
                let (record, tool_warnings) =
                    probe_tool(session, tool, &config, &personas, aborted).await;
                (index, record, tool_warnings)
            });
        }

        let mut slots: Vec<Option<ToolRecord>> = (0..total).map(|_| None).collect();
        let mut completed = 0usize;

        let within_deadline = tokio::time::timeout(self.config.global_deadline, async {
            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok((index, record, mut tool_warnings)) => {
                        completed += 1;
                        self.progress.tool_done(
                            InterviewPhase::Interviewing,
                            &record.descriptor.name,
                            completed,
                            total,
                        );
                        warnings.append(&mut tool_warnings);
                        slots[index] = Some(record);
                    }
                    Err(join_err) => {
                        warnings.push(format!("tool probe task failed: {join_err}"));
                    }
                }
            }
        })
        .await
        .is_ok();

        if !within_deadline {
            tasks.abort_all();
            warnings.push("global interview deadline exceeded".to_string());
        }

        let early_abort = !within_deadline || aborted.load(Ordering::SeqCst);
        if early_abort && !self.config.graceful_partial {
            return Err(crate::error::InterviewError::Fatal(
                "interview aborted before completion".to_string(),
            ));
        }
        let mut partial = early_abort;

        // Tools whose task never finished are recorded bare so the baseline
        // still covers the whole advertised surface.
        let mut tools = Vec::with_capacity(total);
        for (index, slot) in slots.into_iter().enumerate() {
            match slot {
                Some(record) => {
                    partial = partial || record.partial;
                    tools.push(record);
                }
                None => {
                    let mut record =
                        ToolRecord::from_descriptor(discovery.tools[index].clone());
                    record.partial = true;
                    partial = true;
                    tools.push(record);
                }
            }
        }

        self.progress.phase(InterviewPhase::Prompts);
        self.progress.phase(InterviewPhase::Resources);

        if let Some(probe) = &self.security_probe {
            debug!("running security probe hook");
            for record in &mut tools {
                if let Some(fingerprint) =
                    probe.probe(session.as_ref(), &record.descriptor).await
                {
                    record.security = Some(fingerprint);
                }
            }
        }

        self.progress.phase(InterviewPhase::Synthesizing);
        let result = InterviewResult {
            run_id,
            server: discovery.server,
            tools,
            prompts: discovery.prompts,
            resources: discovery.resources,
            resource_templates: discovery.resource_templates,
            personas: persona_ids,
            warnings,
            partial,
            duration_ms: started.elapsed().as_millis() as u64,
        };
        self.progress.phase(InterviewPhase::Complete);
        info!(
            run_id = %result.run_id,
            tools = result.tools.len(),
            partial = result.partial,
            "interview complete"
        );
        Ok(result)
    }
}

/// Probes one tool: battery generation, persona-filtered execution under
/// the per-tool deadline, then fingerprint synthesis.
async fn probe_tool(
    session: Arc<dyn Session>,
    tool: ToolDescriptor,
    config: &InterviewConfig,
    personas: &[Persona],
    aborted: Arc<AtomicBool>,
) -> (ToolRecord, Vec<String>) {
    let mut warnings = Vec::new();

    if aborted.load(Ordering::SeqCst) {
        let mut record = ToolRecord::from_descriptor(tool);
        record.partial = true;
        return (record, warnings);
    }

    // Battery generation is pure; a panic here is a per-tool failure, not
    // an engine failure.
    let generator_config = config.generator_config();
    let fixtures = config.test_fixtures.clone();
    let battery = match catch_unwind(AssertUnwindSafe(|| {
        generate_cases(&tool, &generator_config, &fixtures)
    })) {
        Ok(Ok(cases)) => cases,
        Ok(Err(err)) => {
            warnings.push(format!(
                "{}: {err}; falling back to a minimal battery",
                tool.name
            ));
            fallback_cases(&tool, &fixtures)
        }
        Err(_) => {
            warnings.push(format!(
                "{}: test generation panicked; falling back to a minimal battery",
                tool.name
            ));
            fallback_cases(&tool, &fixtures)
        }
    };

    // Persona × case work list, in persona order.
    let work: Vec<(String, TestCase)> = personas
        .iter()
        .flat_map(|persona| {
            battery
                .iter()
                .filter(|case| persona.covers(case))
                .map(|case| (persona.id.clone(), case.clone()))
                .collect::<Vec<_>>()
        })
        .collect();

    let per_tool_width = if tool.is_idempotent() {
        config.max_parallel_per_tool.max(1)
    } else {
        1
    };

    let samples: Arc<Mutex<Vec<Sample>>> = Arc::new(Mutex::new(Vec::new()));
    let tally: Arc<Mutex<AssessmentTally>> = Arc::new(Mutex::new(AssessmentTally::default()));

    let deadline_hit = tokio::time::timeout(config.per_tool_deadline, async {
        let limiter = Arc::new(Semaphore::new(per_tool_width));
        let mut calls: JoinSet<()> = JoinSet::new();

        for (persona_id, case) in work {
            let session = Arc::clone(&session);
            let limiter = Arc::clone(&limiter);
            let samples = Arc::clone(&samples);
            let tally = Arc::clone(&tally);
            let aborted = Arc::clone(&aborted);
            let tool_name = tool.name.clone();
            let call_timeout = config.per_call_timeout;

            calls.spawn(async move {
                let _permit = limiter.acquire_owned().await.expect("tool limiter closed");
                if aborted.load(Ordering::SeqCst) {
                    return;
                }

                let args = Value::Object(case.args.clone());
                let started = Instant::now();
                let outcome = session
                    .call(
                        "tools/call",
                        Some(json!({"name": tool_name.as_str(), "arguments": args.clone()})),
                        call_timeout,
                    )
                    .await;
                let duration_ms = started.elapsed().as_millis() as u64;

                let sample = match outcome {
                    Ok(result) => {
                        if result
                            .get("isError")
                            .and_then(Value::as_bool)
                            .unwrap_or(false)
                        {
                            Sample::error(&tool_name, args, duration_ms, error_text(&result))
                        } else {
                            Sample::success(&tool_name, args, duration_ms, content_of(result))
                        }
                    }
                    Err(err) => {
                        if err.is_fatal() {
                            warn!(tool = %tool_name, %err, "fatal transport failure, aborting interview");
                            aborted.store(true, Ordering::SeqCst);
                        }
                        Sample::error(&tool_name, args, duration_ms, err.to_string())
                    }
                };

                tally
                    .lock()
                    .expect("tally poisoned")
                    .record(&persona_id, sample.outcome, case.expected_outcome);
                samples.lock().expect("samples poisoned").push(sample);
            });
        }

        while calls.join_next().await.is_some() {}
    })
    .await
    .is_err();

    if deadline_hit {
        warnings.push(format!("{}: per-tool deadline exceeded", tool.name));
    }

    let collected = samples.lock().expect("samples poisoned").clone();
    let assessment = std::mem::take(&mut *tally.lock().expect("tally poisoned")).finish();

    // Fingerprinting is pure as well; trap panics so siblings proceed.
    let tool_name = tool.name.clone();
    let mut record = match catch_unwind(AssertUnwindSafe(|| {
        build_record(tool.clone(), &collected, config.history_cap)
    })) {
        Ok(record) => record,
        Err(_) => {
            warnings.push(format!("{tool_name}: fingerprinting panicked"));
            let mut record = ToolRecord::from_descriptor(tool);
            record.partial = true;
            record
        }
    };

    record.assessment = assessment;
    record.partial = record.partial || deadline_hit || aborted.load(Ordering::SeqCst);
    (record, warnings)
}

/// Folds a tool's samples into its record.
fn build_record(tool: ToolDescriptor, samples: &[Sample], history_cap: usize) -> ToolRecord {
    let mut record = ToolRecord::from_descriptor(tool);
    if samples.is_empty() {
        return record;
    }

    record.response_fingerprint = Some(ResponseFingerprint::from_samples(samples));
    record.error_patterns = cluster_errors(samples);
    record.performance = PerformanceMetrics::from_samples(samples);
    record.response_schema = infer_from_samples(samples);

    if let Some(schema) = record.response_schema.clone() {
        let mut evolution = SchemaEvolution::new(history_cap);
        evolution.observe(schema, samples, Utc::now());
        record.schema_evolution = Some(evolution);
    }

    record
}

/// Pulls the useful payload out of a `tools/call` result: structured
/// content when offered, otherwise the first text block (parsed as JSON
/// when it is JSON), otherwise the raw result.
fn content_of(result: Value) -> Value {
    if let Some(structured) = result.get("structuredContent") {
        return structured.clone();
    }
    if let Some(text) = first_text(&result) {
        if let Ok(parsed) = serde_json::from_str::<Value>(text) {
            return parsed;
        }
        return Value::String(text.to_string());
    }
    result
}

fn error_text(result: &Value) -> String {
    first_text(result)
        .unwrap_or("tool reported an error")
        .to_string()
}

fn first_text(result: &Value) -> Option<&str> {
    result
        .get("content")
        .and_then(Value::as_array)
        .and_then(|blocks| blocks.first())
        .and_then(|block| block.get("text"))
        .and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn content_prefers_structured() {
        let result = json!({
            "structuredContent": {"temp": 20},
            "content": [{"type": "text", "text": "ignored"}]
        });
        assert_eq!(content_of(result), json!({"temp": 20}));
    }

    #[test]
    fn content_parses_json_text_blocks() {
        let result = json!({"content": [{"type": "text", "text": "{\"ok\":true}"}]});
        assert_eq!(content_of(result), json!({"ok": true}));
    }

    #[test]
    fn content_keeps_plain_text() {
        let result = json!({"content": [{"type": "text", "text": "plain answer"}]});
        assert_eq!(content_of(result), json!("plain answer"));
    }

    #[test]
    fn error_text_falls_back() {
        assert_eq!(error_text(&json!({})), "tool reported an error");
        assert_eq!(
            error_text(&json!({"content": [{"type": "text", "text": "bad input"}]})),
            "bad input"
        );
    }
}
