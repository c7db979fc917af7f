//! Command and keyword token catalog.
//!
//! Every token the helpers can put on the wire is enumerated here with its
//! pre-encoded ASCII form: command names uppercase, sub-block keywords
//! lowercase. The server is case-insensitive; the case split just mirrors
//! the domain split, since a keyword is only ever a sub-token of a command
//! and never a command name. The byte forms are `'static` and shared;
//! nothing re-encodes per call.

/// Command name tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cmd {
    Append,
    Decr,
    Decrby,
    Del,
    Echo,
    Exists,
    Expire,
    Get,
    Getset,
    Hdel,
    Hexists,
    Hget,
    Hgetall,
    Hkeys,
    Hlen,
    Hset,
    Hvals,
    Incr,
    Incrby,
    Keys,
    Lindex,
    Llen,
    Lpop,
    Lpush,
    Lrange,
    Lset,
    Ltrim,
    Mget,
    Mset,
    Persist,
    Ping,
    Psubscribe,
    Publish,
    Punsubscribe,
    Rename,
    Rpop,
    Rpush,
    Sadd,
    Scard,
    Set,
    Sismember,
    Smembers,
    Sort,
    Srem,
    Strlen,
    Subscribe,
    Ttl,
    Type,
    Unsubscribe,
    Zadd,
    Zcard,
    Zincrby,
    Zrange,
    Zrem,
    Zscore,
}

impl Cmd {
    /// The pre-encoded uppercase wire form.
    pub const fn bytes(self) -> &'static [u8] {
        match self {
            Cmd::Append => b"APPEND",
            Cmd::Decr => b"DECR",
            Cmd::Decrby => b"DECRBY",
            Cmd::Del => b"DEL",
            Cmd::Echo => b"ECHO",
            Cmd::Exists => b"EXISTS",
            Cmd::Expire => b"EXPIRE",
            Cmd::Get => b"GET",
            Cmd::Getset => b"GETSET",
            Cmd::Hdel => b"HDEL",
            Cmd::Hexists => b"HEXISTS",
            Cmd::Hget => b"HGET",
            Cmd::Hgetall => b"HGETALL",
            Cmd::Hkeys => b"HKEYS",
            Cmd::Hlen => b"HLEN",
            Cmd::Hset => b"HSET",
            Cmd::Hvals => b"HVALS",
            Cmd::Incr => b"INCR",
            Cmd::Incrby => b"INCRBY",
            Cmd::Keys => b"KEYS",
            Cmd::Lindex => b"LINDEX",
            Cmd::Llen => b"LLEN",
            Cmd::Lpop => b"LPOP",
            Cmd::Lpush => b"LPUSH",
            Cmd::Lrange => b"LRANGE",
            Cmd::Lset => b"LSET",
            Cmd::Ltrim => b"LTRIM",
            Cmd::Mget => b"MGET",
            Cmd::Mset => b"MSET",
            Cmd::Persist => b"PERSIST",
            Cmd::Ping => b"PING",
            Cmd::Psubscribe => b"PSUBSCRIBE",
            Cmd::Publish => b"PUBLISH",
            Cmd::Punsubscribe => b"PUNSUBSCRIBE",
            Cmd::Rename => b"RENAME",
            Cmd::Rpop => b"RPOP",
            Cmd::Rpush => b"RPUSH",
            Cmd::Sadd => b"SADD",
            Cmd::Scard => b"SCARD",
            Cmd::Set => b"SET",
            Cmd::Sismember => b"SISMEMBER",
            Cmd::Smembers => b"SMEMBERS",
            Cmd::Sort => b"SORT",
            Cmd::Srem => b"SREM",
            Cmd::Strlen => b"STRLEN",
            Cmd::Subscribe => b"SUBSCRIBE",
            Cmd::Ttl => b"TTL",
            Cmd::Type => b"TYPE",
            Cmd::Unsubscribe => b"UNSUBSCRIBE",
            Cmd::Zadd => b"ZADD",
            Cmd::Zcard => b"ZCARD",
            Cmd::Zincrby => b"ZINCRBY",
            Cmd::Zrange => b"ZRANGE",
            Cmd::Zrem => b"ZREM",
            Cmd::Zscore => b"ZSCORE",
        }
    }
}

/// Sub-block keyword tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kw {
    Alpha,
    By,
    Count,
    Ex,
    Get,
    Limit,
    Match,
    Nx,
    Px,
    Store,
    Withscores,
    Xx,
}

impl Kw {
    /// The pre-encoded lowercase wire form.
    pub const fn bytes(self) -> &'static [u8] {
        match self {
            Kw::Alpha => b"alpha",
            Kw::By => b"by",
            Kw::Count => b"count",
            Kw::Ex => b"ex",
            Kw::Get => b"get",
            Kw::Limit => b"limit",
            Kw::Match => b"match",
            Kw::Nx => b"nx",
            Kw::Px => b"px",
            Kw::Store => b"store",
            Kw::Withscores => b"withscores",
            Kw::Xx => b"xx",
        }
    }
}
