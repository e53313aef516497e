//! Keywords that appear as command arguments

#![allow(missing_docs)]

// SET and SCAN options
pub const EX: &str = "EX";
pub const PX: &str = "PX";
pub const NX: &str = "NX";
pub const XX: &str = "XX";
pub const MATCH: &str = "MATCH";
pub const COUNT: &str = "COUNT";

pub const AGGREGATE: &str = "AGGREGATE";
pub const ALPHA: &str = "ALPHA";
pub const ASC: &str = "ASC";
pub const BY: &str = "BY";
pub const DESC: &str = "DESC";
pub const LIMIT: &str = "LIMIT";
pub const MESSAGE: &str = "MESSAGE";
pub const NO: &str = "NO";
pub const NOSORT: &str = "NOSORT";
pub const PMESSAGE: &str = "PMESSAGE";
pub const OK: &str = "OK";
pub const ONE: &str = "ONE";
pub const QUEUED: &str = "QUEUED";
pub const STORE: &str = "STORE";
pub const WEIGHTS: &str = "WEIGHTS";
pub const WITHSCORES: &str = "WITHSCORES";
pub const RESETSTAT: &str = "RESETSTAT";
pub const REWRITE: &str = "REWRITE";
pub const RESET: &str = "RESET";
pub const FLUSH: &str = "FLUSH";
pub const LOAD: &str = "LOAD";
pub const KILL: &str = "KILL";
pub const LEN: &str = "LEN";
pub const REFCOUNT: &str = "REFCOUNT";
pub const ENCODING: &str = "ENCODING";
pub const IDLETIME: &str = "IDLETIME";
pub const GETNAME: &str = "GETNAME";
pub const SETNAME: &str = "SETNAME";
pub const LIST: &str = "LIST";
pub const PONG: &str = "PONG";
pub const UNLOAD: &str = "UNLOAD";
pub const REPLACE: &str = "REPLACE";
pub const PAUSE: &str = "PAUSE";
pub const DOCTOR: &str = "DOCTOR";
pub const BLOCK: &str = "BLOCK";
pub const NOACK: &str = "NOACK";
pub const STREAMS: &str = "STREAMS";
pub const KEY: &str = "KEY";
pub const CREATE: &str = "CREATE";
pub const MKSTREAM: &str = "MKSTREAM";
pub const SETID: &str = "SETID";
pub const DESTROY: &str = "DESTROY";
pub const DELCONSUMER: &str = "DELCONSUMER";
pub const MAXLEN: &str = "MAXLEN";
pub const GROUP: &str = "GROUP";
pub const IDLE: &str = "IDLE";
pub const RETRYCOUNT: &str = "RETRYCOUNT";
pub const FORCE: &str = "FORCE";
