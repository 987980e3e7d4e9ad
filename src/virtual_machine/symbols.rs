//! Register and label tables.
//!
//! Both tables intern on first use: the first lookup of an unseen name
//! creates its entry and later lookups return the same handle. A table
//! belongs to one assemble or load call, so nothing leaks between runs.

use crate::virtual_machine::errors::VMError;
use std::collections::HashMap;

/// Register names accepted by `PUSHR` and `POPR`.
pub const REGISTER_NAMES: [&str; 5] = ["ax", "bx", "cx", "dx", "ex"];

/// Handle to an interned register.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct RegisterId(usize);

/// Handle to an interned label.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct LabelId(usize);

#[derive(Debug, Clone)]
struct Register {
    name: String,
    value: i64,
}

#[derive(Debug, Clone)]
struct Label {
    name: String,
    /// Line of the defining `LABEL`, `None` until configured.
    target: Option<usize>,
}

/// Symbols bound while configuring one program.
///
/// Besides registers and labels this records the lines of `BEGIN` and `END`,
/// which must be unique per program.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    registers: Vec<Register>,
    labels: Vec<Label>,
    label_index: HashMap<String, LabelId>,
    begin: Option<usize>,
    end: Option<usize>,
}

/// Checks label syntax: an ASCII letter followed by ASCII alphanumerics.
pub fn is_valid_label(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric())
}

impl SymbolTable {
    /// Creates empty tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears every table, as if freshly created.
    pub fn reset(&mut self) {
        self.registers.clear();
        self.labels.clear();
        self.label_index.clear();
        self.begin = None;
        self.end = None;
    }

    /// Returns the handle for register `name`, creating it with value 0 on first use.
    pub fn register(&mut self, name: &str) -> Result<RegisterId, VMError> {
        if !REGISTER_NAMES.contains(&name) {
            return Err(VMError::InvalidRegister {
                token: name.to_string(),
            });
        }
        if let Some(idx) = self.registers.iter().position(|r| r.name == name) {
            return Ok(RegisterId(idx));
        }
        self.registers.push(Register {
            name: name.to_string(),
            value: 0,
        });
        Ok(RegisterId(self.registers.len() - 1))
    }

    pub fn read_register(&self, id: RegisterId) -> i64 {
        self.registers[id.0].value
    }

    pub fn write_register(&mut self, id: RegisterId, value: i64) {
        self.registers[id.0].value = value;
    }

    /// Returns the value of register `name` if the program ever referenced it.
    pub fn register_value(&self, name: &str) -> Option<i64> {
        self.registers
            .iter()
            .find(|r| r.name == name)
            .map(|r| r.value)
    }

    /// Returns the handle for label `name`, creating an unresolved label on first use.
    pub fn label(&mut self, name: &str) -> Result<LabelId, VMError> {
        if !is_valid_label(name) {
            return Err(VMError::InvalidLabel {
                token: name.to_string(),
            });
        }
        if let Some(id) = self.label_index.get(name) {
            return Ok(*id);
        }
        let id = LabelId(self.labels.len());
        self.labels.push(Label {
            name: name.to_string(),
            target: None,
        });
        self.label_index.insert(name.to_string(), id);
        Ok(id)
    }

    /// Binds a label to the line of its `LABEL` instruction.
    pub fn define_label(&mut self, id: LabelId, line: usize) -> Result<(), VMError> {
        let label = &mut self.labels[id.0];
        if let Some(first) = label.target {
            return Err(VMError::DuplicateLabel {
                label: label.name.clone(),
                first: first + 1,
            });
        }
        label.target = Some(line);
        Ok(())
    }

    pub fn label_name(&self, id: LabelId) -> &str {
        &self.labels[id.0].name
    }

    pub fn label_target(&self, id: LabelId) -> Option<usize> {
        self.labels[id.0].target
    }

    /// Resolves a jump target, failing if the label was never defined.
    pub fn jump_target(&self, id: LabelId) -> Result<usize, VMError> {
        let label = &self.labels[id.0];
        label.target.ok_or_else(|| VMError::UnresolvedLabel {
            label: label.name.clone(),
        })
    }

    /// Names of labels that are referenced but never defined.
    pub fn unresolved_labels(&self) -> impl Iterator<Item = &str> {
        self.labels
            .iter()
            .filter(|l| l.target.is_none())
            .map(|l| l.name.as_str())
    }

    /// Records the line of `BEGIN`.
    pub fn mark_begin(&mut self, line: usize) -> Result<(), VMError> {
        if let Some(first) = self.begin {
            return Err(VMError::DuplicateBegin { first: first + 1 });
        }
        self.begin = Some(line);
        Ok(())
    }

    /// Records the line of `END`.
    pub fn mark_end(&mut self, line: usize) -> Result<(), VMError> {
        if let Some(first) = self.end {
            return Err(VMError::DuplicateEnd { first: first + 1 });
        }
        self.end = Some(line);
        Ok(())
    }

    /// Line of `BEGIN`, if configured.
    pub fn begin(&self) -> Option<usize> {
        self.begin
    }

    /// Line of `END`, if configured.
    pub fn end(&self) -> Option<usize> {
        self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_interning() {
        let mut symbols = SymbolTable::new();
        let ax = symbols.register("ax").unwrap();
        let bx = symbols.register("bx").unwrap();
        assert_ne!(ax, bx);
        assert_eq!(symbols.register("ax").unwrap(), ax);

        symbols.write_register(ax, -777);
        assert_eq!(symbols.read_register(ax), -777);
        assert_eq!(symbols.register_value("ax"), Some(-777));
        assert_eq!(symbols.register_value("bx"), Some(0));
        assert_eq!(symbols.register_value("cx"), None);
    }

    #[test]
    fn register_names_are_closed() {
        let mut symbols = SymbolTable::new();
        for bad in ["", "rax", "AX", "fx", "ax1"] {
            assert!(matches!(
                symbols.register(bad),
                Err(VMError::InvalidRegister { ref token }) if token == bad
            ));
        }
        for name in REGISTER_NAMES {
            assert!(symbols.register(name).is_ok());
        }
    }

    #[test]
    fn label_syntax() {
        assert!(is_valid_label("sett0ings"));
        assert!(is_valid_label("L"));
        assert!(!is_valid_label(""));
        assert!(!is_valid_label("1_name"));
        assert!(!is_valid_label("name_"));
        assert!(!is_valid_label("loop:"));
    }

    #[test]
    fn label_resolution() {
        let mut symbols = SymbolTable::new();
        let target = symbols.label("target").unwrap();
        assert_eq!(symbols.label_target(target), None);
        assert!(matches!(
            symbols.jump_target(target),
            Err(VMError::UnresolvedLabel { ref label }) if label == "target"
        ));
        assert_eq!(symbols.unresolved_labels().collect::<Vec<_>>(), vec!["target"]);

        symbols.define_label(target, 5).unwrap();
        assert_eq!(symbols.jump_target(target).unwrap(), 5);
        assert_eq!(symbols.label("target").unwrap(), target);
        assert_eq!(symbols.label_name(target), "target");
        assert_eq!(symbols.unresolved_labels().count(), 0);
    }

    #[test]
    fn label_redefinition_rejected() {
        let mut symbols = SymbolTable::new();
        let id = symbols.label("dup").unwrap();
        symbols.define_label(id, 2).unwrap();
        assert!(matches!(
            symbols.define_label(id, 8),
            Err(VMError::DuplicateLabel { ref label, first: 3 }) if label == "dup"
        ));
        assert_eq!(symbols.label_target(id), Some(2));
    }

    #[test]
    fn begin_end_unique() {
        let mut symbols = SymbolTable::new();
        symbols.mark_begin(0).unwrap();
        assert!(matches!(
            symbols.mark_begin(4),
            Err(VMError::DuplicateBegin { first: 1 })
        ));
        symbols.mark_end(9).unwrap();
        assert!(matches!(
            symbols.mark_end(10),
            Err(VMError::DuplicateEnd { first: 10 })
        ));
        assert_eq!(symbols.begin(), Some(0));
        assert_eq!(symbols.end(), Some(9));
    }

    #[test]
    fn reset_clears_everything() {
        let mut symbols = SymbolTable::new();
        let ax = symbols.register("ax").unwrap();
        symbols.write_register(ax, 3);
        let l = symbols.label("a").unwrap();
        symbols.define_label(l, 1).unwrap();
        symbols.mark_begin(0).unwrap();

        symbols.reset();
        assert_eq!(symbols.register_value("ax"), None);
        assert_eq!(symbols.begin(), None);
        let l = symbols.label("a").unwrap();
        assert_eq!(symbols.label_target(l), None);
    }
}
