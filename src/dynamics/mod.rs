//! Tree dynamics: the articulated-body inward and outward passes.

mod aba;

pub(crate) use aba::ABASolver;
