/// Typed room persistence on top of the session store.
pub mod room;
/// Expiring key-value store abstraction and its backends.
pub mod session_store;
/// Storage error types shared by every backend.
pub mod storage;
