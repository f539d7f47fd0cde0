//! Qubit, classical bit and register types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A quantum bit, identified by register name and index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Qubit {
    /// Name of the owning register.
    pub register: String,
    /// Index within the register.
    pub index: u32,
}

impl Qubit {
    /// Create a qubit reference.
    pub fn new(register: impl Into<String>, index: u32) -> Self {
        Self {
            register: register.into(),
            index,
        }
    }
}

impl fmt::Display for Qubit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.register, self.index)
    }
}

/// A classical bit, identified by register name and index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Clbit {
    /// Name of the owning register.
    pub register: String,
    /// Index within the register.
    pub index: u32,
}

impl Clbit {
    /// Create a classical bit reference.
    pub fn new(register: impl Into<String>, index: u32) -> Self {
        Self {
            register: register.into(),
            index,
        }
    }
}

impl fmt::Display for Clbit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.register, self.index)
    }
}

/// A declared register.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Register {
    /// Register name.
    pub name: String,
    /// Number of bits.
    pub size: u32,
}

impl Register {
    /// Create a register declaration.
    pub fn new(name: impl Into<String>, size: u32) -> Self {
        Self {
            name: name.into(),
            size,
        }
    }

    /// Whether `index` falls inside the register.
    pub fn contains(&self, index: u32) -> bool {
        index < self.size
    }

    /// The qubits of this register, in index order.
    pub fn qubits(&self) -> impl Iterator<Item = Qubit> + '_ {
        (0..self.size).map(|i| Qubit::new(self.name.clone(), i))
    }

    /// The classical bits of this register, in index order.
    pub fn clbits(&self) -> impl Iterator<Item = Clbit> + '_ {
        (0..self.size).map(|i| Clbit::new(self.name.clone(), i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qubit_display() {
        assert_eq!(Qubit::new("q", 3).to_string(), "q[3]");
        assert_eq!(Clbit::new("c", 0).to_string(), "c[0]");
    }

    #[test]
    fn test_identity_is_name_and_index() {
        assert_eq!(Qubit::new("q", 1), Qubit::new(String::from("q"), 1));
        assert_ne!(Qubit::new("q", 1), Qubit::new("r", 1));
    }

    #[test]
    fn test_register_members() {
        let reg = Register::new("a", 3);
        let qs: Vec<_> = reg.qubits().collect();
        assert_eq!(qs.len(), 3);
        assert_eq!(qs[2], Qubit::new("a", 2));
        assert!(reg.contains(2));
        assert!(!reg.contains(3));
    }
}
