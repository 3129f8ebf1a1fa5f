use std::fmt;
use util::{EnumFromStr, ParseEnumError};
use util_derive::EnumFromStr;

// Instruction set for the accumulator machine.
//
//   Mnemonic | Arg  | Effect
//  ----------+------+---------------------------------------
//   ZERO     |  -   | A = 0
//   INC      |  -   | A = A + 1
//   DEC      |  -   | A = max(A - 1, 0)
//   SHL      |  -   | A = 2 * A
//   SHR      |  -   | A = A / 2
//   LOAD i   | addr | A = P[i]
//   STORE i  | addr | P[i] = A
//   ADD i    | addr | A = A + P[i]
//   SUB i    | addr | A = max(A - P[i], 0)
//   SCAN i   | addr | P[i] = next input value, or 0
//   PRINT i  | addr | append P[i] to output
//   JUMP t   |  ip  | K = t
//   JZ t     |  ip  | K = t if A == 0, else K = K + 1
//   JG t     |  ip  | K = t if A > 0, else K = K + 1
//   JODD t   |  ip  | K = t if A is odd, else K = K + 1
//   HALT     |  -   | stop

/// All non-branch instructions implicitly increment `K`; see the table above
/// for the four that instead set `K` directly.
#[derive(Clone, Copy, PartialEq, Eq, Debug, EnumFromStr)]
pub enum Opcode {
    ZERO,
    INC,
    DEC,
    SHL,
    SHR,
    LOAD,
    STORE,
    ADD,
    SUB,
    SCAN,
    PRINT,
    JUMP,
    JZ,
    JG,
    JODD,
    HALT,
}

macro_rules! impl_enum_display {
    ($e:ty) => {
        impl fmt::Display for $e {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                fmt::Debug::fmt(self, f)
            }
        }
    };
}

impl_enum_display!(Opcode);

impl Opcode {
    /// Whether this opcode carries a memory address or branch target argument.
    pub fn takes_arg(self) -> bool {
        !matches!(
            self,
            Opcode::ZERO | Opcode::INC | Opcode::DEC | Opcode::SHL | Opcode::SHR | Opcode::HALT
        )
    }

    /// Whether this opcode's argument is a branch target rather than a memory address.
    pub fn is_branch(self) -> bool {
        matches!(self, Opcode::JUMP | Opcode::JZ | Opcode::JG | Opcode::JODD)
    }
}

/// An instruction's argument, before or after backpatching.
///
/// A finalized program contains only [`Arg::Resolved`] values; [`Arg::Label`]
/// only appears transiently while the code generator is still emitting
/// branches whose targets have not yet been bound to a position.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Arg {
    Resolved(usize),
    Label(String),
}

/// A single instruction: an opcode plus an optional argument.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Instruction {
    pub op: Opcode,
    pub arg: Option<Arg>,
}

impl Instruction {
    pub fn bare(op: Opcode) -> Instruction {
        debug_assert!(!op.takes_arg());
        Instruction { op, arg: None }
    }

    pub fn with_address(op: Opcode, address: usize) -> Instruction {
        debug_assert!(op.takes_arg() && !op.is_branch());
        Instruction {
            op,
            arg: Some(Arg::Resolved(address)),
        }
    }

    pub fn with_label(op: Opcode, label: impl Into<String>) -> Instruction {
        debug_assert!(op.is_branch());
        Instruction {
            op,
            arg: Some(Arg::Label(label.into())),
        }
    }

    /// The resolved argument, once backpatching has replaced every label.
    ///
    /// # Panics
    ///
    /// Panics if the argument is still a symbolic label. A finalized program
    /// never carries one; this is the generator's unresolved-label bug
    /// surfacing at the one place the VM would otherwise silently misbehave.
    pub fn resolved_arg(&self) -> Option<usize> {
        match &self.arg {
            None => None,
            Some(Arg::Resolved(v)) => Some(*v),
            Some(Arg::Label(name)) => {
                panic!("instruction argument is an unresolved label: {}", name)
            }
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.resolved_arg() {
            Some(arg) => write!(f, "{} {}", self.op, arg),
            None => write!(f, "{}", self.op),
        }
    }
}

/// Parses a single textual-dump line (`OP` or `OP ARG`) into an [`Instruction`].
impl std::str::FromStr for Instruction {
    type Err = ParseEnumError;

    fn from_str(line: &str) -> Result<Instruction, ParseEnumError> {
        let mut parts = line.split_whitespace();
        let op_str = parts.next().ok_or_else(|| ParseEnumError {
            value: line.to_owned(),
            enum_name: "Instruction",
        })?;
        let op = Opcode::from_str(op_str)?;
        let arg = match parts.next() {
            Some(a) => {
                let address: usize = a.parse().map_err(|_| ParseEnumError {
                    value: a.to_owned(),
                    enum_name: "Instruction argument",
                })?;
                Some(Arg::Resolved(address))
            }
            None => None,
        };
        if op.takes_arg() != arg.is_some() {
            return Err(ParseEnumError {
                value: line.to_owned(),
                enum_name: "Instruction",
            });
        }
        Ok(Instruction { op, arg })
    }
}
