//! The nftables expressions a rule is made of, together with their encoders
//! for the two output dialects. Every variant mirrors one low-level
//! expression of the in-kernel virtual machine.
//!
//! An encoder does one of three things: write a register (and emit nothing),
//! consume a register and emit a statement, or emit a statement outright.
//! `Ok(None)` from an encoder means the expression only updated register or
//! header-context state.

use serde_json::Value;

use crate::error::FormatError;
use crate::ir::Ir;
use crate::proto::HeaderCtx;
use crate::rule::Rule;
use crate::set::SetCache;

mod bitwise;
pub use self::bitwise::*;

mod byteorder;
pub use self::byteorder::*;

mod cmp;
pub use self::cmp::*;

mod connlimit;
pub use self::connlimit::*;

mod counter;
pub use self::counter::*;

mod ct;
pub use self::ct::*;

mod dup;
pub use self::dup::*;

mod dynset;
pub use self::dynset::*;

mod exthdr;
pub use self::exthdr::*;

mod fib;
pub use self::fib::*;

mod flow_offload;
pub use self::flow_offload::*;

mod hash;
pub use self::hash::*;

mod immediate;
pub use self::immediate::*;

mod limit;
pub use self::limit::*;

mod log;
pub use self::log::*;

mod lookup;
pub use self::lookup::*;

mod masquerade;
pub use self::masquerade::*;

mod meta;
pub use self::meta::*;

mod nat;
pub use self::nat::*;

mod notrack;
pub use self::notrack::*;

mod numgen;
pub use self::numgen::*;

mod objref;
pub use self::objref::*;

mod payload;
pub use self::payload::*;

mod queue;
pub use self::queue::*;

mod quota;
pub use self::quota::*;

mod range;
pub use self::range::*;

pub mod register;
pub use self::register::REG_VERDICT;
pub(crate) use self::register::{RegOrigin, RegValue, Registers};

mod reject;
pub use self::reject::*;

mod rt;
pub use self::rt::*;

mod socket;
pub use self::socket::*;

mod tproxy;
pub use self::tproxy::*;

mod verdict;
pub use self::verdict::*;

mod xt;
pub use self::xt::*;

/// The mutable state threaded through one encode pass over a rule: the
/// register file, the protocol-header context and the shared set cache.
pub(crate) struct EncodeCtx<'a> {
    pub regs: Registers,
    pub hdr: HeaderCtx,
    pub sets: &'a SetCache,
    pub rule: &'a Rule,
}

impl<'a> EncodeCtx<'a> {
    pub fn new(rule: &'a Rule, sets: &'a SetCache) -> Self {
        EncodeCtx {
            regs: Registers::new(),
            hdr: HeaderCtx::new(),
            sets,
            rule,
        }
    }
}

/// One expression of a rule's expression sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Bitwise(Bitwise),
    Byteorder(Byteorder),
    Cmp(Cmp),
    Connlimit(Connlimit),
    Counter(Counter),
    Ct(Ct),
    Dup(Dup),
    Dynset(Dynset),
    Exthdr(Exthdr),
    Fib(Fib),
    FlowOffload(FlowOffload),
    Hash(Hash),
    Immediate(Immediate),
    Limit(Limit),
    Log(Log),
    Lookup(Lookup),
    Masquerade(Masquerade),
    Match(Match),
    Meta(Meta),
    Nat(Nat),
    Notrack(Notrack),
    Numgen(Numgen),
    Objref(Objref),
    Payload(Payload),
    Queue(Queue),
    Quota(Quota),
    Range(Range),
    Redirect(Redirect),
    Reject(Reject),
    Rt(Rt),
    Socket(Socket),
    Target(Target),
    TProxy(TProxy),
    Verdict(Verdict),
    /// An expression this crate has no encoder for, kept by name so the
    /// error names the culprit.
    Raw(RawExpression),
}

/// Payload of an unrecognised expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawExpression {
    pub name: String,
    pub data: Vec<u8>,
}

macro_rules! for_each_variant {
    ($self:ident, $e:ident => $body:expr) => {
        match $self {
            Expression::Bitwise($e) => $body,
            Expression::Byteorder($e) => $body,
            Expression::Cmp($e) => $body,
            Expression::Connlimit($e) => $body,
            Expression::Counter($e) => $body,
            Expression::Ct($e) => $body,
            Expression::Dup($e) => $body,
            Expression::Dynset($e) => $body,
            Expression::Exthdr($e) => $body,
            Expression::Fib($e) => $body,
            Expression::FlowOffload($e) => $body,
            Expression::Hash($e) => $body,
            Expression::Immediate($e) => $body,
            Expression::Limit($e) => $body,
            Expression::Log($e) => $body,
            Expression::Lookup($e) => $body,
            Expression::Masquerade($e) => $body,
            Expression::Match($e) => $body,
            Expression::Meta($e) => $body,
            Expression::Nat($e) => $body,
            Expression::Notrack($e) => $body,
            Expression::Numgen($e) => $body,
            Expression::Objref($e) => $body,
            Expression::Payload($e) => $body,
            Expression::Queue($e) => $body,
            Expression::Quota($e) => $body,
            Expression::Range($e) => $body,
            Expression::Redirect($e) => $body,
            Expression::Reject($e) => $body,
            Expression::Rt($e) => $body,
            Expression::Socket($e) => $body,
            Expression::Target($e) => $body,
            Expression::TProxy($e) => $body,
            Expression::Verdict($e) => $body,
            Expression::Raw($e) => $body,
        }
    };
}

impl Expression {
    /// The netlink name of the expression, used when wrapping errors.
    pub fn name(&self) -> &'static str {
        match self {
            Expression::Bitwise(_) => "bitwise",
            Expression::Byteorder(_) => "byteorder",
            Expression::Cmp(_) => "cmp",
            Expression::Connlimit(_) => "connlimit",
            Expression::Counter(_) => "counter",
            Expression::Ct(_) => "ct",
            Expression::Dup(_) => "dup",
            Expression::Dynset(_) => "dynset",
            Expression::Exthdr(_) => "exthdr",
            Expression::Fib(_) => "fib",
            Expression::FlowOffload(_) => "flow_offload",
            Expression::Hash(_) => "hash",
            Expression::Immediate(_) => "immediate",
            Expression::Limit(_) => "limit",
            Expression::Log(_) => "log",
            Expression::Lookup(_) => "lookup",
            Expression::Masquerade(_) => "masq",
            Expression::Match(_) => "match",
            Expression::Meta(_) => "meta",
            Expression::Nat(_) => "nat",
            Expression::Notrack(_) => "notrack",
            Expression::Numgen(_) => "numgen",
            Expression::Objref(_) => "objref",
            Expression::Payload(_) => "payload",
            Expression::Queue(_) => "queue",
            Expression::Quota(_) => "quota",
            Expression::Range(_) => "range",
            Expression::Redirect(_) => "redir",
            Expression::Reject(_) => "reject",
            Expression::Rt(_) => "rt",
            Expression::Socket(_) => "socket",
            Expression::Target(_) => "target",
            Expression::TProxy(_) => "tproxy",
            Expression::Verdict(_) => "verdict",
            Expression::Raw(_) => "unknown",
        }
    }

    pub(crate) fn encode_text(&self, ctx: &mut EncodeCtx) -> Result<Option<Ir>, FormatError> {
        for_each_variant!(self, e => e.encode_text(ctx))
    }

    pub(crate) fn encode_json(&self, ctx: &mut EncodeCtx) -> Result<Option<Value>, FormatError> {
        for_each_variant!(self, e => e.encode_json(ctx))
    }
}

impl RawExpression {
    pub(crate) fn encode_text(&self, _ctx: &mut EncodeCtx) -> Result<Option<Ir>, FormatError> {
        Err(FormatError::UnknownExpression(self.name.clone()))
    }

    pub(crate) fn encode_json(&self, _ctx: &mut EncodeCtx) -> Result<Option<Value>, FormatError> {
        Err(FormatError::UnknownExpression(self.name.clone()))
    }
}
