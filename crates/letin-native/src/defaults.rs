//! The eight native functions every environment ships regardless of which
//! native libraries it loads (§6), at fixed indices `0..=7`
//! (`MAX_DEFAULT_NATIVE_FUN_INDEX`).

use crate::checking::{check_byte_string, check_float, check_int, check_unique_object};
use crate::setting::{set_byte_string, set_pair};
use letin_gc::GarbageCollector;
use letin_value::{ObjectKind, Value};
use letin_vm::{Result, RuntimeError, Thrown};
use std::io::{Read, Write};

fn arg(args: &[Value], i: usize) -> Result<Value> {
    args.get(i).copied().ok_or_else(|| Thrown::new(RuntimeError::IncorrectArgCount))
}

/// `atoi: [Int8] -> Int`. Parses a leading, optionally-signed decimal integer
/// out of a byte string; non-digit trailing bytes are ignored, matching the
/// permissive C `atoi` the name is borrowed from.
pub fn atoi(gc: &GarbageCollector, args: Vec<Value>) -> Result<Value> {
    let bytes = check_byte_string(gc, arg(&args, 0)?)?;
    let text = String::from_utf8_lossy(&bytes);
    let digits: String = text
        .trim_start()
        .chars()
        .enumerate()
        .take_while(|(i, c)| c.is_ascii_digit() || (*i == 0 && (*c == '-' || *c == '+')))
        .map(|(_, c)| c)
        .collect();
    let n: i64 = digits.parse().unwrap_or(0);
    Ok(Value::Int(n))
}

/// `itoa: Int -> [Int8]`. Formats an integer as its decimal ASCII rendering.
pub fn itoa(gc: &GarbageCollector, args: Vec<Value>) -> Result<Value> {
    let i = check_int(arg(&args, 0)?)?;
    Ok(set_byte_string(gc, i.to_string().into_bytes()))
}

/// `atof: [Int8] -> Float`. Parses a leading decimal float out of a byte string.
pub fn atof(gc: &GarbageCollector, args: Vec<Value>) -> Result<Value> {
    let bytes = check_byte_string(gc, arg(&args, 0)?)?;
    let text = String::from_utf8_lossy(&bytes);
    let digits: String = text
        .trim_start()
        .chars()
        .enumerate()
        .take_while(|(i, c)| {
            c.is_ascii_digit() || *c == '.' || (*i == 0 && (*c == '-' || *c == '+'))
        })
        .map(|(_, c)| c)
        .collect();
    let f: f64 = digits.parse().unwrap_or(0.0);
    Ok(Value::Float(f))
}

/// `ftoa: Float -> [Int8]`. Formats a float as its decimal ASCII rendering.
pub fn ftoa(gc: &GarbageCollector, args: Vec<Value>) -> Result<Value> {
    let f = check_float(arg(&args, 0)?)?;
    Ok(set_byte_string(gc, f.to_string().into_bytes()))
}

/// `get_char: unique Io -> (Io, Int)`. Reads one byte from standard input;
/// end of input is reported as `-1`, matching C's `getchar`.
pub fn get_char(gc: &GarbageCollector, args: Vec<Value>) -> Result<Value> {
    let io_ref = check_unique_object(gc, arg(&args, 0)?, ObjectKind::Io)?;
    let mut byte = [0u8; 1];
    let c = match std::io::stdin().read(&mut byte) {
        Ok(0) => -1,
        Ok(_) => byte[0] as i64,
        Err(_) => -1,
    };
    Ok(set_pair(gc, Value::Ref(io_ref), Value::Int(c)))
}

/// `put_char: (unique Io, Int) -> Io`. Writes one byte to standard output.
pub fn put_char(gc: &GarbageCollector, args: Vec<Value>) -> Result<Value> {
    let io_ref = check_unique_object(gc, arg(&args, 0)?, ObjectKind::Io)?;
    let c = check_int(arg(&args, 1)?)?;
    let mut stdout = std::io::stdout();
    let _ = stdout.write_all(&[c as u8]);
    let _ = stdout.flush();
    Ok(Value::Ref(io_ref))
}

/// `get_line: unique Io -> (Io, [Int8])`. Reads one line from standard input,
/// excluding the trailing newline.
pub fn get_line(gc: &GarbageCollector, args: Vec<Value>) -> Result<Value> {
    let io_ref = check_unique_object(gc, arg(&args, 0)?, ObjectKind::Io)?;
    let mut line = String::new();
    let _ = std::io::stdin().read_line(&mut line);
    if line.ends_with('\n') {
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
    }
    let bytes = set_byte_string(gc, line.into_bytes());
    Ok(set_pair(gc, Value::Ref(io_ref), bytes))
}

/// `put_string: (unique Io, [Int8]) -> Io`. Writes a byte string to standard
/// output verbatim.
pub fn put_string(gc: &GarbageCollector, args: Vec<Value>) -> Result<Value> {
    let io_ref = check_unique_object(gc, arg(&args, 0)?, ObjectKind::Io)?;
    let bytes = check_byte_string(gc, arg(&args, 1)?)?;
    let mut stdout = std::io::stdout();
    let _ = stdout.write_all(&bytes);
    let _ = stdout.flush();
    Ok(Value::Ref(io_ref))
}
