//! The callback surface a caller implements to receive resolution
//! outcomes.

use crate::dns::records::{A, Aaaa, Cname, Mx, Ptr, RecordData};
use crate::dns::response::Response;
use crate::dns::{RecordType, Records};
use crate::error::ErrorKind;

/// A type-tagged view over a response's answer section, replacing the
/// original collaborator's five overloaded `onSuccess` methods with one
/// method and an exhaustive match. A `match` over this enum's variants is
/// checked for exhaustiveness by the compiler, which is the whole reason
/// for choosing tagged dispatch over overloading here: there is no
/// fallthrough to accidentally omit a `break` from.
pub enum RecordSet<'r> {
    A(Records<'r, A>),
    Aaaa(Records<'r, Aaaa>),
    Mx(Records<'r, Mx>),
    Cname(Records<'r, Cname>),
    Ptr(Records<'r, Ptr>),
    /// Any QTYPE this crate has no typed payload for. The caller can still
    /// inspect [`Response::message`] directly for the raw answer section.
    Raw(&'r Response),
}

/// Build the typed [`RecordSet`] view for `qtype` over `response`'s answer
/// section, falling back to [`RecordSet::Raw`] for any QTYPE this crate has
/// no typed payload for.
fn classify<'r>(qtype: RecordType, response: &'r Response) -> RecordSet<'r> {
    match qtype {
        RecordType::A => RecordSet::A(response.records::<A>()),
        RecordType::Aaaa => RecordSet::Aaaa(response.records::<Aaaa>()),
        RecordType::Mx => RecordSet::Mx(response.records::<Mx>()),
        RecordType::Cname => RecordSet::Cname(response.records::<Cname>()),
        RecordType::Ptr => RecordSet::Ptr(response.records::<Ptr>()),
        _ => RecordSet::Raw(response),
    }
}

/// Receives the outcome of one query. Implementations are invoked from
/// whichever request task owns the query, so should not block; spawn a
/// task of the caller's own if the work is heavier than a quick dispatch.
///
/// Object-safe so a [`crate::Context`] can hold `Box<dyn Handler>` per
/// request without a generic parameter threading through every type that
/// touches it.
pub trait Handler: Send + Sync {
    /// The terminal failure outcome for a request: no usable response was
    /// ever obtained, or the obtained response was itself an error.
    fn on_failure(&self, kind: ErrorKind);

    /// The terminal success outcome: a response was obtained. The default
    /// implementation classifies the response's QTYPE and forwards to
    /// [`Handler::on_success`]; override this directly instead if the
    /// typed dispatch below does not fit (e.g. to inspect several record
    /// types from one response).
    ///
    /// A `NOERROR` response with zero answers of the requested type is
    /// still reported here as success-with-empty; wrap a handler in
    /// [`NodataAware`] to have that case reported as
    /// `on_failure(ErrorKind::Nodata)` instead.
    fn on_received(&self, qtype: RecordType, response: &Response) {
        self.on_success(classify(qtype, response));
    }

    /// Called once per completed request with the typed record set for
    /// the QTYPE that was queried. Default implementation does nothing;
    /// override the arms relevant to the QTYPEs this handler queries for.
    fn on_success(&self, _records: RecordSet<'_>) {}
}

/// Wraps a [`Handler`] so a `NOERROR` response carrying zero answers of the
/// requested type is reported as `on_failure(ErrorKind::Nodata)` rather
/// than an empty [`RecordSet`] — the typed convenience layer on top of the
/// raw engine's success-with-empty behavior. Only applies to the five
/// typed QTYPEs `RecordSet` covers; a `Raw` QTYPE always reaches
/// `on_success` unchanged, since there is no typed count to judge it by.
pub struct NodataAware<H>(pub H);

impl<H: Handler> Handler for NodataAware<H> {
    fn on_failure(&self, kind: ErrorKind) {
        self.0.on_failure(kind);
    }

    fn on_received(&self, qtype: RecordType, response: &Response) {
        let is_typed = matches!(
            qtype,
            RecordType::A
                | RecordType::Aaaa
                | RecordType::Mx
                | RecordType::Cname
                | RecordType::Ptr
        );
        if is_typed && !response.has_any(qtype) {
            self.0.on_failure(ErrorKind::Nodata);
            return;
        }
        self.0.on_success(classify(qtype, response));
    }

    fn on_success(&self, records: RecordSet<'_>) {
        self.0.on_success(records);
    }
}
