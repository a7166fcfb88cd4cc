//! Audit trace: renders a variable's dependency tree with the values the
//! store has cached, so a surprising figure can be walked back to its inputs.

use std::collections::HashMap;
use std::fmt::Write;

use crate::eval::VariableStore;
use crate::registry::{Behavior, Value, VariableId};

pub fn format_trace(store: &VariableStore, target: crate::registry::VarKey) -> String {
    let mut tracer = Tracer {
        store,
        visited_at_level: HashMap::new(),
        output: String::new(),
    };

    match store.registry().id_of(target) {
        Some(id) => {
            let _ = writeln!(tracer.output, "AUDIT TRACE for variable '{target}':");
            let _ = writeln!(
                tracer.output,
                "--------------------------------------------------"
            );
            tracer.trace_variable(id, 1, "");
        }
        None => {
            let _ = writeln!(tracer.output, "Error: unknown variable '{target}'");
        }
    }
    tracer.output
}

struct Tracer<'a, 'b> {
    store: &'a VariableStore<'b>,
    visited_at_level: HashMap<VariableId, usize>,
    output: String,
}

impl Tracer<'_, '_> {
    fn trace_variable(&mut self, id: VariableId, level: usize, prefix: &str) {
        if let Some(&first_seen) = self.visited_at_level.get(&id) {
            let _ = writeln!(self.output, "{}-> (Ref to L{})", prefix, first_seen);
            return;
        }
        self.visited_at_level.insert(id, level);

        let registry = self.store.registry();
        let def = registry.def(id);
        let line_header = format!("[L{}] {}{}", level, def.key, self.format_value(id));

        match &def.behavior {
            Behavior::Leaf { default, .. } => {
                let _ = writeln!(
                    self.output,
                    "{}{} -> leaf (default {})",
                    prefix, line_header, default
                );
            }
            Behavior::Derived { .. } => {
                let _ = writeln!(self.output, "{}{}", prefix, line_header);
                self.recurse_dependencies(prefix, id, level);
            }
            Behavior::Aggregate { default, .. } => {
                let _ = writeln!(
                    self.output,
                    "{}{} -> folded over children (default {})",
                    prefix, line_header, default
                );
            }
        }
    }

    fn recurse_dependencies(&mut self, prefix: &str, id: VariableId, level: usize) {
        let dependencies = self.store.registry().dependencies(id).to_vec();
        let stem = build_child_stem(prefix);
        for (i, dep) in dependencies.iter().enumerate() {
            let connector = if i == dependencies.len() - 1 {
                "`--"
            } else {
                "|--"
            };
            let full_prefix = format!("{stem}{connector}");
            self.trace_variable(*dep, level + 1, &full_prefix);
        }
    }

    fn format_value(&self, id: VariableId) -> String {
        let key = self.store.registry().def(id).key;
        match self.store.peek(key) {
            Some(Value::Float(v)) => format!("[{v:.3}]"),
            Some(Value::System(s)) => format!("[{}]", s.label()),
            None => "[?]".to_string(),
        }
    }
}

fn build_child_stem(current_prefix: &str) -> String {
    current_prefix.replace("`--", "   ").replace("|--", "|  ")
}
