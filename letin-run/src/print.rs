//! Prints an entry function's raw return value for the one-argument start
//! path. The original driver prints all four fields of its `ReturnValue`
//! union unconditionally (`i=`, `f=`, `r=`, `error=`) because C++ reads
//! whichever bits are there regardless of which member was last written;
//! against a tagged [`Value`] that would just be noise, so only the variant
//! actually held is printed.

use letin_runtime::VirtualMachine;
use letin_value::{ObjectKind, ObjectPayload, Value};

pub fn print_value_result(vm: &VirtualMachine, value: Value) {
    match value {
        Value::Int(i) => println!("i={i}"),
        Value::Float(f) => println!("f={f}"),
        Value::Ref(r) => {
            // SAFETY: `r` is the entry function's returned reference, kept
            // alive immortally or by the caller's ownership of `value` for
            // the duration of this read.
            let object = unsafe { vm.gc().object(r) };
            if object.payload.kind() == ObjectKind::IArray8 {
                if let ObjectPayload::IArray8(bytes) = &object.payload {
                    println!("r=\"{}\"", escape_byte_string(bytes));
                    return;
                }
            }
            println!("r={r:?}");
        }
        Value::CanceledRef(r) => println!("r={r:?} (canceled)"),
        Value::LazyRef(r) | Value::LockedLazyRef(r) => println!("r={r:?} (unforced)"),
        Value::Pair(a, b) => println!("pair=({a}, {b})"),
        Value::Error(code) => println!("error={code}"),
    }
}

fn escape_byte_string(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for &b in bytes {
        match b {
            0x07 => out.push_str("\\a"),
            0x08 => out.push_str("\\b"),
            b'\t' => out.push_str("\\t"),
            b'\n' => out.push_str("\\n"),
            0x0B => out.push_str("\\v"),
            0x0C => out.push_str("\\f"),
            b'\r' => out.push_str("\\r"),
            _ if b.is_ascii_graphic() || b == b' ' => out.push(b as char),
            _ => out.push_str(&format!("\\{b:03o}")),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_control_characters_and_keeps_printable_ones() {
        assert_eq!(escape_byte_string(b"hi\n"), "hi\\n");
        assert_eq!(escape_byte_string(b"\x07\x08\t\x0b\x0c\r"), "\\a\\b\\t\\v\\f\\r");
        assert_eq!(escape_byte_string(b"abc"), "abc");
    }

    #[test]
    fn escapes_non_printable_bytes_as_octal() {
        assert_eq!(escape_byte_string(&[0x01]), "\\001");
        assert_eq!(escape_byte_string(&[0xFF]), "\\377");
    }
}
