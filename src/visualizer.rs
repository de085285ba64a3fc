use crate::search::Plan;
use crate::{Act, GoalSet, Result, State};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// A visualizer for plans that generates Graphviz DOT files
#[derive(Debug, Default)]
pub struct PlanVisualizer;

impl PlanVisualizer {
    /// Create a new plan visualizer
    pub fn new() -> Self {
        Self
    }

    /// Write a DOT visualization of a plan to `path`
    pub fn visualize_plan(
        &self,
        root: &State,
        plan: &Plan,
        goals: &GoalSet,
        path: impl AsRef<Path>,
    ) -> Result<()> {
        let mut file = BufWriter::new(File::create(path)?);
        self.render(root, plan, goals, &mut file)?;
        file.flush()?;
        Ok(())
    }

    /// Write a DOT visualization of a plan to any writer.
    ///
    /// The plan is drawn as a chain from the root state through each step's
    /// expected state. Goals the plan deferred hang off the root.
    pub fn render<W: Write>(
        &self,
        root: &State,
        plan: &Plan,
        goals: &GoalSet,
        out: &mut W,
    ) -> Result<()> {
        // Write DOT file header
        writeln!(out, "digraph Plan {{")?;
        writeln!(out, "    rankdir=LR;")?;
        writeln!(out, "    node [shape=box, style=filled, fillcolor=lightblue];")?;
        writeln!(out, "    edge [fontsize=10];")?;

        writeln!(
            out,
            "    step_0 [label=\"Initial State\\n{}\", fillcolor=lightgreen];",
            Self::state_to_string(root)
        )?;

        for (i, step) in plan.iter().enumerate() {
            let fill = match step.act {
                Act::Action(_) => "lightblue",
                Act::Goal(_) => "lightcoral",
            };
            writeln!(
                out,
                "    step_{} [label=\"{}\\n{}\", fillcolor={}];",
                i + 1,
                Self::escape(step.act.name()),
                Self::state_to_string(&step.state),
                fill
            )?;
            writeln!(
                out,
                "    step_{} -> step_{} [label=\"cost: {}\"];",
                i,
                i + 1,
                step.act.cost()
            )?;
        }

        // Deferred goals
        for (i, goal) in goals.iter().enumerate() {
            writeln!(
                out,
                "    goal_{} [label=\"Goal: {}\", shape=ellipse, fillcolor=lightpink];",
                i,
                Self::escape(goal.name())
            )?;
            writeln!(out, "    step_0 -> goal_{} [style=dashed];", i)?;
        }

        writeln!(out, "}}")?;
        Ok(())
    }

    /// Helper method to convert a state to a string representation
    fn state_to_string(state: &State) -> String {
        state
            .iter()
            .map(|(key, value)| format!("{}: {}", Self::escape(key), value))
            .collect::<Vec<_>>()
            .join("\\n")
    }

    fn escape(label: &str) -> String {
        label.replace('\\', "\\\\").replace('"', "\\\"")
    }
}
