pub(crate) mod states;
pub(crate) mod transfer;
pub(crate) mod transport;
