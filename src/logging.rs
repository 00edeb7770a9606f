//! Internal logging helpers for structured events.
//!
//! The crate only talks to the [`log`] facade; installing a logger is left to the
//! application.

/// Single logging target for the crate.
pub(crate) const LOG_TARGET: &str = "be_tree";

/// Key/value pairs appended to every line logged within a component.
#[derive(Clone, Copy, Debug)]
pub(crate) struct LogContext {
    common_kv: &'static str,
}

impl LogContext {
    pub(crate) const fn new(common_kv: &'static str) -> Self {
        Self { common_kv }
    }

    pub(crate) fn common_kv(&self) -> &'static str {
        self.common_kv
    }
}

macro_rules! be_tree_log {
    ($level:expr, ctx: $ctx:expr, $event:expr, $fmt:expr $(, $args:expr)* $(,)?) => {{
        if log::log_enabled!(target: crate::logging::LOG_TARGET, $level) {
            log::log!(
                target: crate::logging::LOG_TARGET,
                $level,
                "event={} {} {}",
                $event,
                $ctx.common_kv(),
                format_args!($fmt $(, $args)*)
            );
        }
    }};
}

pub(crate) use be_tree_log;
