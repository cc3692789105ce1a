use core::{cell::RefCell, fmt::Write};
use std::{
    collections::BTreeMap,
    error::Error,
    fmt::{self, Display},
};

use log::debug;

use crate::ptr::{make_shared, make_shared_class, SharedClass, SharedFromThis, SharedPtr, WeakPtr};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScenarioErrorKind {
    UnknownCommand(String),
    MissingArgument,
    InvalidNumber(String),
    UnknownSlot(String),
    WrongHandle(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioError {
    pub line: usize,
    pub kind: ScenarioErrorKind,
}

impl Display for ScenarioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: ", self.line)?;
        match &self.kind {
            ScenarioErrorKind::UnknownCommand(c) => write!(f, "unknown command `{c}`"),
            ScenarioErrorKind::MissingArgument => f.write_str("missing argument"),
            ScenarioErrorKind::InvalidNumber(n) => write!(f, "invalid number `{n}`"),
            ScenarioErrorKind::UnknownSlot(s) => write!(f, "unknown slot `{s}`"),
            ScenarioErrorKind::WrongHandle(s) => write!(f, "slot `{s}` holds another handle kind"),
        }
    }
}

impl Error for ScenarioError {}

type Report = SharedPtr<RefCell<String>>;

struct Node {
    value: i64,
    report: Report,
    shared: SharedClass<Node>,
}

impl SharedFromThis for Node {
    fn shared_class(&self) -> &SharedClass<Self> {
        &self.shared
    }
}

impl Drop for Node {
    fn drop(&mut self) {
        if let Some(report) = self.report.get() {
            let _ = writeln!(report.borrow_mut(), "drop {}", self.value);
        }
    }
}

enum Handle {
    Shared(SharedPtr<Node>),
    Weak(WeakPtr<Node>),
}

struct Machine {
    report: Report,
    slots: BTreeMap<String, Handle>,
}

impl Machine {
    fn slot(&self, name: &str) -> Result<&Handle, ScenarioErrorKind> {
        self.slots
            .get(name)
            .ok_or_else(|| ScenarioErrorKind::UnknownSlot(name.to_string()))
    }
    fn shared(&self, name: &str) -> Result<&SharedPtr<Node>, ScenarioErrorKind> {
        match self.slot(name)? {
            Handle::Shared(p) => Ok(p),
            Handle::Weak(_) => Err(ScenarioErrorKind::WrongHandle(name.to_string())),
        }
    }
    fn weak(&self, name: &str) -> Result<&WeakPtr<Node>, ScenarioErrorKind> {
        match self.slot(name)? {
            Handle::Weak(w) => Ok(w),
            Handle::Shared(_) => Err(ScenarioErrorKind::WrongHandle(name.to_string())),
        }
    }
    fn set(&mut self, name: &str, handle: Handle) {
        self.slots.insert(name.to_string(), handle);
    }
    fn print(&self, name: &str) -> Result<(), ScenarioErrorKind> {
        let (value, shared, weak, valid) = match self.slot(name)? {
            Handle::Shared(p) => (
                p.get().map(|n| n.value),
                p.shared_num(),
                p.weak_num(),
                p.is_valid(),
            ),
            Handle::Weak(w) => {
                let value = w.pin().get().map(|n| n.value);
                (value, w.shared_num(), w.weak_num(), w.is_valid())
            }
        };
        let value = value.map_or_else(|| "null".to_string(), |v| v.to_string());
        let _ = writeln!(
            self.report.borrow_mut(),
            "{name}: value={value} shared={shared} weak={weak} valid={valid}"
        );
        Ok(())
    }
    fn command(&mut self, words: &[&str]) -> Result<(), ScenarioErrorKind> {
        let arg = |i: usize| words.get(i).copied().ok_or(ScenarioErrorKind::MissingArgument);
        match words[0] {
            "new" => {
                let text = arg(2)?;
                let value = text
                    .parse()
                    .map_err(|_| ScenarioErrorKind::InvalidNumber(text.to_string()))?;
                let node = make_shared_class(Node {
                    value,
                    report: self.report.clone(),
                    shared: SharedClass::new(),
                });
                self.set(arg(1)?, Handle::Shared(node));
            }
            "copy" => {
                let p = self.shared(arg(2)?)?.clone();
                self.set(arg(1)?, Handle::Shared(p));
            }
            "move" => {
                let (dst, src) = (arg(1)?, arg(2)?);
                let handle = match self.slot(src)? {
                    Handle::Shared(_) => Handle::Shared(SharedPtr::null()),
                    Handle::Weak(_) => Handle::Weak(WeakPtr::null()),
                };
                let moved = self.slots.insert(src.to_string(), handle);
                if let Some(moved) = moved {
                    self.set(dst, moved);
                }
            }
            "weak" => {
                let w = WeakPtr::from(self.shared(arg(2)?)?);
                self.set(arg(1)?, Handle::Weak(w));
            }
            "pin" => {
                let p = self.weak(arg(2)?)?.pin();
                self.set(arg(1)?, Handle::Shared(p));
            }
            "self" => {
                let p = self
                    .shared(arg(2)?)?
                    .get()
                    .map_or_else(SharedPtr::null, Node::as_shared);
                self.set(arg(1)?, Handle::Shared(p));
            }
            "reset" => {
                let name = arg(1)?;
                match self.slots.get_mut(name) {
                    Some(Handle::Shared(p)) => p.reset(),
                    Some(Handle::Weak(w)) => w.reset(),
                    None => return Err(ScenarioErrorKind::UnknownSlot(name.to_string())),
                }
            }
            "print" => self.print(arg(1)?)?,
            c => return Err(ScenarioErrorKind::UnknownCommand(c.to_string())),
        }
        Ok(())
    }
}

/// Runs a script of pointer operations and returns its report.
///
/// Handles left in slots are released in slot name order after the last command.
pub fn execute(script: &str) -> Result<String, ScenarioError> {
    let report = make_shared(RefCell::new(String::new()));
    let mut machine = Machine {
        report: report.clone(),
        slots: BTreeMap::new(),
    };
    for (i, line) in script.lines().enumerate() {
        let words: Vec<&str> = line
            .split('#')
            .next()
            .unwrap_or_default()
            .split_whitespace()
            .collect();
        if words.is_empty() {
            continue;
        }
        debug!("{}: {}", i + 1, words.join(" "));
        machine.command(&words).map_err(|kind| ScenarioError { line: i + 1, kind })?;
    }
    drop(machine);
    let result = report.borrow().clone();
    Ok(result)
}

#[cfg(test)]
mod test {
    use wasm_bindgen_test::wasm_bindgen_test;

    use super::{execute, ScenarioError, ScenarioErrorKind};

    #[test]
    #[wasm_bindgen_test]
    fn test_example() {
        let report = execute(
            "new p 42\n\
             print p\n\
             weak w p\n\
             print w\n\
             reset p\n\
             print w\n\
             pin q w\n\
             print q\n",
        )
        .unwrap();
        assert_eq!(
            report,
            "p: value=42 shared=1 weak=1 valid=true\n\
             w: value=42 shared=1 weak=2 valid=true\n\
             drop 42\n\
             w: value=null shared=0 weak=1 valid=false\n\
             q: value=null shared=0 weak=0 valid=false\n"
        );
    }

    #[test]
    #[wasm_bindgen_test]
    fn test_copy_move_self() {
        let report = execute(
            "# self references share the block\n\
             new a 1\n\
             self b a\n\
             print a\n\
             move c b   # b is empty now\n\
             print b\n\
             copy d c\n\
             print c\n\
             reset a\n\
             reset c\n\
             print d\n",
        )
        .unwrap();
        assert_eq!(
            report,
            "a: value=1 shared=2 weak=1 valid=true\n\
             b: value=null shared=0 weak=0 valid=false\n\
             c: value=1 shared=3 weak=1 valid=true\n\
             d: value=1 shared=1 weak=1 valid=true\n\
             drop 1\n"
        );
    }

    #[test]
    #[wasm_bindgen_test]
    fn test_release_order() {
        let report = execute("new b 2\nnew a 1\n").unwrap();
        assert_eq!(report, "drop 1\ndrop 2\n");
    }

    #[test]
    #[wasm_bindgen_test]
    fn test_errors() {
        assert_eq!(
            execute("new a 1\nfly a\n"),
            Err(ScenarioError {
                line: 2,
                kind: ScenarioErrorKind::UnknownCommand("fly".to_string())
            })
        );
        assert_eq!(
            execute("new a x").unwrap_err().kind,
            ScenarioErrorKind::InvalidNumber("x".to_string())
        );
        assert_eq!(
            execute("\ncopy a").unwrap_err(),
            ScenarioError {
                line: 2,
                kind: ScenarioErrorKind::MissingArgument
            }
        );
        assert_eq!(
            execute("print z").unwrap_err().kind,
            ScenarioErrorKind::UnknownSlot("z".to_string())
        );
        assert_eq!(
            execute("new a 1\npin b a").unwrap_err().kind,
            ScenarioErrorKind::WrongHandle("a".to_string())
        );
        assert_eq!(
            execute("new a 1\nfly a\n").unwrap_err().to_string(),
            "line 2: unknown command `fly`"
        );
    }
}
