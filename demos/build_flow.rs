//! A complete example showing how to declare tasks and wire them into a flow.
//!
//! This example demonstrates:
//! - Declaring task logic with an input signature
//! - Reading run inputs through `Parameter` tasks
//! - Calling tasks to record dependencies in the current flow
//! - Serializing a task and restoring it with the same id
//! - Running the graph by hand

use serde_json::json;
use std::collections::HashMap;
use std::time::Duration;
use taskwright::prelude::*;

// ============================================================================
// Step 1: Greeting Task
// ============================================================================

/// Builds a greeting from a name and an optional punctuation mark.
#[derive(Clone, Default)]
struct GreetLogic;

impl TaskLogic for GreetLogic {
    fn signature(&self) -> Signature {
        "name, punctuation?".parse().expect("valid signature")
    }

    fn run(&self, ctx: &RunContext<'_>) -> Result<NodeValue, Signal> {
        let name = ctx
            .inputs
            .get("name")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Signal::fail("no name to greet"))?;
        let punctuation = ctx
            .inputs
            .get("punctuation")
            .and_then(|v| v.as_str())
            .unwrap_or(".");
        Ok(json!(format!("Hello, {}{}", name, punctuation)))
    }

    fn clone_box(&self) -> Box<dyn TaskLogic> {
        Box::new(self.clone())
    }
}

// ============================================================================
// Step 2: Shout Task
// ============================================================================

/// Upper-cases whatever it receives, plus any extra keyword inputs.
#[derive(Clone, Default)]
struct ShoutLogic;

impl TaskLogic for ShoutLogic {
    fn signature(&self) -> Signature {
        Signature::new().param("text").var_keyword("extra")
    }

    fn run(&self, ctx: &RunContext<'_>) -> Result<NodeValue, Signal> {
        let mut keys: Vec<&String> = ctx.inputs.keys().collect();
        keys.sort();
        let text = keys
            .into_iter()
            .filter_map(|k| ctx.inputs[k].as_str())
            .collect::<Vec<_>>()
            .join(" ");
        Ok(json!(text.to_uppercase()))
    }

    fn clone_box(&self) -> Box<dyn TaskLogic> {
        Box::new(self.clone())
    }
}

// ============================================================================
// Main: Build, Inspect and Run the Flow
// ============================================================================

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Taskwright Build Flow Example ===\n");

    let flow = Flow::new("greeting");
    let shout = flow.scope(|| -> Result<Called, taskwright::BindingError> {
        let name = Parameter::task("name", None, true);
        let greeting = Task::builder(GreetLogic)
            .max_retries(2)
            .retry_delay(Duration::from_secs(5))
            .build()
            .call(CallArgs::new().arg(name).kwarg("punctuation", "!"))?;

        Task::builder(ShoutLogic)
            .trigger(triggers::ALL_FINISHED)
            .build()
            .call(CallArgs::new().arg(greeting).kwarg("suffix", "welcome"))
    })?
    .into_task();

    println!("--- Graph ---");
    for edge in flow.edges() {
        println!(
            "  {:?} -[{}]-> {:?}",
            edge.upstream,
            edge.key.as_deref().unwrap_or("-"),
            edge.downstream
        );
    }

    // A naive runner: keep sweeping, running every task whose upstream
    // results are all available.
    println!("\n--- Run ---");
    let parameters = HashMap::from([("name".to_string(), json!("Alice"))]);
    let mut results: HashMap<Task, NodeValue> = HashMap::new();
    while results.len() < flow.len() {
        for task in flow.tasks() {
            if results.contains_key(&task) {
                continue;
            }
            let edges = flow.edges_to(&task);
            if !edges.iter().all(|e| results.contains_key(&e.upstream)) {
                continue;
            }
            let inputs: HashMap<String, NodeValue> = edges
                .into_iter()
                .filter_map(|e| Some((e.key?, results.get(&e.upstream)?.clone())))
                .collect();
            let result = task.run_with(&inputs, &parameters)?;
            println!("  {:?} => {}", task, result);
            results.insert(task, result);
        }
    }

    println!("\n--- Serialized ---");
    let record = shout.to_json()?;
    println!("{}", serde_json::to_string_pretty(&record)?);

    taskwright::register_task_type_of::<ShoutLogic>();
    let restored = Task::from_json(record)?;
    println!("\nRestored {:?} (same id: {})", restored, restored.id() == shout.id());

    Ok(())
}
