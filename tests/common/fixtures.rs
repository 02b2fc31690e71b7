//! Static log corpora used across harnesses.
//!
//! Each corpus is a `&'static [&'static str]` of representative log lines,
//! one per shape the parser has to cope with.

/// Heroku log drain output: octet framing, PRIVAL, drain ID, dyno logfmt.
pub const CORPUS_HEROKU: &[&str] = &[
    "296 <158>1 2015-03-20T19:22:56.023454+00:00 d.f12ee345-3239-4fde-8dc6-b5d1c5656c36 heroku router - - at=info method=POST path=\"/v1/oauth/token\" host=api.g2m.me request_id=4ce69d2b-fd28-44f0-809c-05e192a0b2e0 fwd=\"54.160.189.106,173.245.56.103\" dyno=web.2 connect=1ms service=4ms status=200 bytes=455",
    "<158>1 2015-03-20T19:22:57.000001+00:00 host heroku router - - at=info method=GET path=\"/users/42/avatar\" dyno=web.1 connect=0ms service=12ms status=304 bytes=0",
    "<158>1 2015-03-20T19:22:58.000000+00:00 host heroku router - - at=error code=H12 desc=\"Request timeout\" method=GET path=\"/users/7\" dyno=web.2 service=30000ms status=503",
    "d 2015-03-20T19:23:00+00:00 app web.1 - - State changed from starting to up",
];

/// Application lines with a JSON payload after a free-text prefix.
pub const CORPUS_JSON: &[&str] = &[
    r#"2015-06-12T00:11:22.333Z someName {"num": 123}"#,
    r#"2015-06-12T00:11:23Z api - {"level":"info","req":{"method":"GET","path":"/v1"},"ms":4.5}"#,
    r#"2015-06-12T00:11:24Z worker {"ok":true,"retry":null,"tags":["a","b"]}"#,
];

/// Node.js Winston output: microsecond timestamps and `+hh:mm` offsets.
pub const CORPUS_WINSTON: &[&str] = &[
    "2015-03-20T19:22:56.023454+01:00 info: listening port=8080 env=production",
    "2015-03-20T19:22:57.100000+01:00 warn: slow query ms=912 table=users",
];

/// LogEntries' tick-quoted logfmt.
pub const CORPUS_TICK_QUOTED: &[&str] = &[
    "2015-06-12T00:11:22Z frontend msg='hello world' level='info'",
    "web.1 timestamp='2015-06-12T00:11:22Z' msg='it said \"hi\"' user='bob'",
];

/// Lines that must not produce a record.
pub const CORPUS_UNPARSEABLE: &[&str] = &[
    "",
    "   ",
    "no timestamp here",
    "Jan 15 10:00:02 myhost sshd[12345]: Failed password",
    "2015-06-12 00:11:22 space separated is not supported",
];
