//! Command name constants
//!
//! Names are spelled the way the server documents them. Pass them to
//! [`Client::execute`](crate::Client::execute) for commands without a typed wrapper.

#![allow(missing_docs)]

pub const PING: &str = "PING";
pub const SET: &str = "SET";
pub const GET: &str = "GET";
pub const QUIT: &str = "QUIT";
pub const EXISTS: &str = "EXISTS";
pub const DEL: &str = "DEL";
pub const UNLINK: &str = "UNLINK";
pub const TYPE: &str = "TYPE";
pub const FLUSHDB: &str = "FLUSHDB";
pub const KEYS: &str = "KEYS";
pub const RANDOMKEY: &str = "RANDOMKEY";
pub const RENAME: &str = "RENAME";
pub const RENAMENX: &str = "RENAMENX";
pub const DBSIZE: &str = "DBSIZE";
pub const EXPIRE: &str = "EXPIRE";
pub const EXPIREAT: &str = "EXPIREAT";
pub const TTL: &str = "TTL";
pub const SELECT: &str = "SELECT";
pub const MOVE: &str = "MOVE";
pub const FLUSHALL: &str = "FLUSHALL";
pub const GETSET: &str = "GETSET";
pub const MGET: &str = "MGET";
pub const SETNX: &str = "SETNX";
pub const SETEX: &str = "SETEX";
pub const MSET: &str = "MSET";
pub const MSETNX: &str = "MSETNX";
pub const DECRBY: &str = "DECRBY";
pub const DECR: &str = "DECR";
pub const INCRBY: &str = "INCRBY";
pub const INCR: &str = "INCR";
pub const APPEND: &str = "APPEND";
pub const SUBSTR: &str = "SUBSTR";
pub const HSET: &str = "HSET";
pub const HGET: &str = "HGET";
pub const HSETNX: &str = "HSETNX";
pub const HMSET: &str = "HMSET";
pub const HMGET: &str = "HMGET";
pub const HINCRBY: &str = "HINCRBY";
pub const HEXISTS: &str = "HEXISTS";
pub const HDEL: &str = "HDEL";
pub const HLEN: &str = "HLEN";
pub const HKEYS: &str = "HKEYS";
pub const HVALS: &str = "HVALS";
pub const HGETALL: &str = "HGETALL";
pub const RPUSH: &str = "RPUSH";
pub const LPUSH: &str = "LPUSH";
pub const LLEN: &str = "LLEN";
pub const LRANGE: &str = "LRANGE";
pub const LTRIM: &str = "LTRIM";
pub const LINDEX: &str = "LINDEX";
pub const LSET: &str = "LSET";
pub const LREM: &str = "LREM";
pub const LPOP: &str = "LPOP";
pub const RPOP: &str = "RPOP";
pub const RPOPLPUSH: &str = "RPOPLPUSH";
pub const SADD: &str = "SADD";
pub const SMEMBERS: &str = "SMEMBERS";
pub const SREM: &str = "SREM";
pub const SPOP: &str = "SPOP";
pub const SMOVE: &str = "SMOVE";
pub const SCARD: &str = "SCARD";
pub const SISMEMBER: &str = "SISMEMBER";
pub const SINTER: &str = "SINTER";
pub const SINTERSTORE: &str = "SINTERSTORE";
pub const SUNION: &str = "SUNION";
pub const SUNIONSTORE: &str = "SUNIONSTORE";
pub const SDIFF: &str = "SDIFF";
pub const SDIFFSTORE: &str = "SDIFFSTORE";
pub const SRANDMEMBER: &str = "SRANDMEMBER";
pub const ZADD: &str = "ZADD";
pub const ZRANGE: &str = "ZRANGE";
pub const ZREM: &str = "ZREM";
pub const ZINCRBY: &str = "ZINCRBY";
pub const ZRANK: &str = "ZRANK";
pub const ZREVRANK: &str = "ZREVRANK";
pub const ZREVRANGE: &str = "ZREVRANGE";
pub const ZCARD: &str = "ZCARD";
pub const ZSCORE: &str = "ZSCORE";
pub const MULTI: &str = "MULTI";
pub const DISCARD: &str = "DISCARD";
pub const EXEC: &str = "EXEC";
pub const WATCH: &str = "WATCH";
pub const UNWATCH: &str = "UNWATCH";
pub const SORT: &str = "SORT";
pub const BLPOP: &str = "BLPOP";
pub const BRPOP: &str = "BRPOP";
pub const AUTH: &str = "AUTH";
pub const SUBSCRIBE: &str = "SUBSCRIBE";
pub const PUBLISH: &str = "PUBLISH";
pub const UNSUBSCRIBE: &str = "UNSUBSCRIBE";
pub const PSUBSCRIBE: &str = "PSUBSCRIBE";
pub const PUNSUBSCRIBE: &str = "PUNSUBSCRIBE";
pub const PUBSUB: &str = "PUBSUB";
pub const ZCOUNT: &str = "ZCOUNT";
pub const ZRANGEBYSCORE: &str = "ZRANGEBYSCORE";
pub const ZREVRANGEBYSCORE: &str = "ZREVRANGEBYSCORE";
pub const ZREMRANGEBYRANK: &str = "ZREMRANGEBYRANK";
pub const ZREMRANGEBYSCORE: &str = "ZREMRANGEBYSCORE";
pub const ZUNIONSTORE: &str = "ZUNIONSTORE";
pub const ZINTERSTORE: &str = "ZINTERSTORE";
pub const ZLEXCOUNT: &str = "ZLEXCOUNT";
pub const ZRANGEBYLEX: &str = "ZRANGEBYLEX";
pub const ZREVRANGEBYLEX: &str = "ZREVRANGEBYLEX";
pub const ZREMRANGEBYLEX: &str = "ZREMRANGEBYLEX";
pub const SAVE: &str = "SAVE";
pub const BGSAVE: &str = "BGSAVE";
pub const BGREWRITEAOF: &str = "BGREWRITEAOF";
pub const LASTSAVE: &str = "LASTSAVE";
pub const SHUTDOWN: &str = "SHUTDOWN";
pub const INFO: &str = "INFO";
pub const MONITOR: &str = "MONITOR";
pub const SLAVEOF: &str = "SLAVEOF";
pub const CONFIG: &str = "CONFIG";
pub const STRLEN: &str = "STRLEN";
pub const SYNC: &str = "SYNC";
pub const LPUSHX: &str = "LPUSHX";
pub const PERSIST: &str = "PERSIST";
pub const RPUSHX: &str = "RPUSHX";
pub const ECHO: &str = "ECHO";
pub const LINSERT: &str = "LINSERT";
pub const DEBUG: &str = "DEBUG";
pub const BRPOPLPUSH: &str = "BRPOPLPUSH";
pub const SETBIT: &str = "SETBIT";
pub const GETBIT: &str = "GETBIT";
pub const BITPOS: &str = "BITPOS";
pub const SETRANGE: &str = "SETRANGE";
pub const GETRANGE: &str = "GETRANGE";
pub const EVAL: &str = "EVAL";
pub const EVALSHA: &str = "EVALSHA";
pub const SCRIPT: &str = "SCRIPT";
pub const SLOWLOG: &str = "SLOWLOG";
pub const OBJECT: &str = "OBJECT";
pub const BITCOUNT: &str = "BITCOUNT";
pub const BITOP: &str = "BITOP";
pub const SENTINEL: &str = "SENTINEL";
pub const DUMP: &str = "DUMP";
pub const RESTORE: &str = "RESTORE";
pub const PEXPIRE: &str = "PEXPIRE";
pub const PEXPIREAT: &str = "PEXPIREAT";
pub const PTTL: &str = "PTTL";
pub const INCRBYFLOAT: &str = "INCRBYFLOAT";
pub const PSETEX: &str = "PSETEX";
pub const CLIENT: &str = "CLIENT";
pub const TIME: &str = "TIME";
pub const MIGRATE: &str = "MIGRATE";
pub const HINCRBYFLOAT: &str = "HINCRBYFLOAT";
pub const SCAN: &str = "SCAN";
pub const HSCAN: &str = "HSCAN";
pub const SSCAN: &str = "SSCAN";
pub const ZSCAN: &str = "ZSCAN";
pub const WAIT: &str = "WAIT";
pub const CLUSTER: &str = "CLUSTER";
pub const ASKING: &str = "ASKING";
pub const PFADD: &str = "PFADD";
pub const PFCOUNT: &str = "PFCOUNT";
pub const PFMERGE: &str = "PFMERGE";
pub const READONLY: &str = "READONLY";
pub const GEOADD: &str = "GEOADD";
pub const GEODIST: &str = "GEODIST";
pub const GEOHASH: &str = "GEOHASH";
pub const GEOPOS: &str = "GEOPOS";
pub const GEORADIUS: &str = "GEORADIUS";
pub const GEORADIUS_RO: &str = "GEORADIUS_RO";
pub const GEORADIUSBYMEMBER: &str = "GEORADIUSBYMEMBER";
pub const GEORADIUSBYMEMBER_RO: &str = "GEORADIUSBYMEMBER_RO";
pub const MODULE: &str = "MODULE";
pub const BITFIELD: &str = "BITFIELD";
pub const HSTRLEN: &str = "HSTRLEN";
pub const TOUCH: &str = "TOUCH";
pub const SWAPDB: &str = "SWAPDB";
pub const MEMORY: &str = "MEMORY";
pub const XADD: &str = "XADD";
pub const XLEN: &str = "XLEN";
pub const XDEL: &str = "XDEL";
pub const XTRIM: &str = "XTRIM";
pub const XRANGE: &str = "XRANGE";
pub const XREVRANGE: &str = "XREVRANGE";
pub const XREAD: &str = "XREAD";
pub const XACK: &str = "XACK";
pub const XGROUP: &str = "XGROUP";
pub const XREADGROUP: &str = "XREADGROUP";
pub const XPENDING: &str = "XPENDING";
pub const XCLAIM: &str = "XCLAIM";
