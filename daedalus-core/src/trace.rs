use std::env;
use std::fmt;
use std::sync::OnceLock;

/// Trace categories, enabled via environment variables.
///
/// Supported:
/// - DAEDALUS_TRACE="vm,external,instance" (comma/space separated; "all" enables all)
/// - DAEDALUS_TRACE_VM=1, DAEDALUS_TRACE_EXTERNAL=1, DAEDALUS_TRACE_INSTANCE=1
///
/// `vm` logs every executed instruction, so expect a lot of output.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TraceKind {
    Vm,
    External,
    Instance,
}

const M_VM: u32 = 1 << 0;
const M_EXTERNAL: u32 = 1 << 1;
const M_INSTANCE: u32 = 1 << 2;

impl TraceKind {
    fn mask(self) -> u32 {
        match self {
            TraceKind::Vm => M_VM,
            TraceKind::External => M_EXTERNAL,
            TraceKind::Instance => M_INSTANCE,
        }
    }
}

fn parse_bool_env(name: &str) -> bool {
    match env::var(name) {
        Ok(v) => {
            let s = v.trim().to_ascii_lowercase();
            !(s.is_empty() || s == "0" || s == "false" || s == "no" || s == "off")
        }
        Err(_) => false,
    }
}

fn parse_mask_from_trace_list(s: &str) -> u32 {
    let mut mask = 0u32;
    for raw in s.split(|c: char| c == ',' || c == ';' || c.is_whitespace()) {
        let t = raw.trim().to_ascii_lowercase();
        match t.as_str() {
            "" => {}
            "all" => mask |= M_VM | M_EXTERNAL | M_INSTANCE,
            "vm" => mask |= M_VM,
            "external" | "ext" => mask |= M_EXTERNAL,
            "instance" | "inst" => mask |= M_INSTANCE,
            _ => {}
        }
    }
    mask
}

fn build_mask() -> u32 {
    let mut mask = env::var("DAEDALUS_TRACE")
        .map(|list| parse_mask_from_trace_list(&list))
        .unwrap_or(0);

    if parse_bool_env("DAEDALUS_TRACE_VM") {
        mask |= M_VM;
    }
    if parse_bool_env("DAEDALUS_TRACE_EXTERNAL") {
        mask |= M_EXTERNAL;
    }
    if parse_bool_env("DAEDALUS_TRACE_INSTANCE") {
        mask |= M_INSTANCE;
    }
    mask
}

fn mask() -> u32 {
    static MASK: OnceLock<u32> = OnceLock::new();
    *MASK.get_or_init(build_mask)
}

pub fn enabled(k: TraceKind) -> bool {
    mask() & k.mask() != 0
}

pub fn vm(args: fmt::Arguments) {
    if !enabled(TraceKind::Vm) {
        return;
    }
    log::info!("{}", args);
}

pub fn external(args: fmt::Arguments) {
    if !enabled(TraceKind::External) {
        return;
    }
    log::info!("{}", args);
}

pub fn instance(args: fmt::Arguments) {
    if !enabled(TraceKind::Instance) {
        return;
    }
    log::info!("{}", args);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trace_list_parsing() {
        assert_eq!(parse_mask_from_trace_list("vm, ext"), M_VM | M_EXTERNAL);
        assert_eq!(parse_mask_from_trace_list("ALL"), M_VM | M_EXTERNAL | M_INSTANCE);
        assert_eq!(parse_mask_from_trace_list("bogus;;instance"), M_INSTANCE);
        assert_eq!(parse_mask_from_trace_list(""), 0);
    }
}
