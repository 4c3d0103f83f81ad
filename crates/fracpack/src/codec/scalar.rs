//! Int and Float encodings.

use fracpack_buffers::{InputStream, OutputStream};

use super::mismatch;
use crate::error::{FracpackError, Result};
use crate::value::Value;

fn out_of_range(bits: u32, signed: bool) -> FracpackError {
    FracpackError::IntegerOutOfRange { bits, signed }
}

fn signed_range(bits: u32) -> (i64, i64) {
    if bits >= 64 {
        (i64::MIN, i64::MAX)
    } else {
        (-(1i64 << (bits - 1)), (1i64 << (bits - 1)) - 1)
    }
}

fn fits_unsigned(value: u64, bits: u32) -> bool {
    bits >= 64 || value >> bits == 0
}

/// Writes an integer of `bits` width in `ceil(bits / 8)` little-endian bytes.
pub(crate) fn pack_int(value: &Value, bits: u32, signed: bool, out: &mut OutputStream) -> Result<()> {
    let raw = if signed {
        let v = match value {
            Value::Integer(i) => *i,
            Value::UInteger(u) => i64::try_from(*u).map_err(|_| out_of_range(bits, signed))?,
            other => return Err(mismatch("integer", other)),
        };
        let (min, max) = signed_range(bits);
        if v < min || v > max {
            return Err(out_of_range(bits, signed));
        }
        v as u64
    } else {
        let v = match value {
            Value::UInteger(u) => *u,
            Value::Integer(i) => u64::try_from(*i).map_err(|_| out_of_range(bits, signed))?,
            other => return Err(mismatch("integer", other)),
        };
        if !fits_unsigned(v, bits) {
            return Err(out_of_range(bits, signed));
        }
        v
    };
    let size = bits.div_ceil(8) as usize;
    out.write_bytes(&raw.to_le_bytes()[..size]);
    Ok(())
}

pub(crate) fn unpack_int(bits: u32, signed: bool, input: &mut InputStream<'_>) -> Result<Value> {
    let size = bits.div_ceil(8);
    let bytes = input.read_bytes(size)?;
    let mut buf = [0u8; 8];
    buf[..bytes.len()].copy_from_slice(bytes);
    let raw = u64::from_le_bytes(buf);
    if signed {
        let shift = 64 - size * 8;
        let v = ((raw << shift) as i64) >> shift;
        let (min, max) = signed_range(bits);
        if v < min || v > max {
            return Err(out_of_range(bits, signed));
        }
        Ok(Value::Integer(v))
    } else {
        if !fits_unsigned(raw, bits) {
            return Err(out_of_range(bits, signed));
        }
        Ok(Value::UInteger(raw))
    }
}

fn as_f64(value: &Value) -> Result<f64> {
    match value {
        Value::Float(f) => Ok(*f),
        Value::Integer(i) => Ok(*i as f64),
        Value::UInteger(u) => Ok(*u as f64),
        other => Err(mismatch("float", other)),
    }
}

pub(crate) fn pack_float(value: &Value, exp: u32, mantissa: u32, out: &mut OutputStream) -> Result<()> {
    match (exp, mantissa) {
        (8, 24) => out.write_f32(as_f64(value)? as f32),
        (11, 53) => out.write_f64(as_f64(value)?),
        _ => return Err(FracpackError::UnsupportedFloat { exp, mantissa }),
    }
    Ok(())
}

pub(crate) fn unpack_float(exp: u32, mantissa: u32, input: &mut InputStream<'_>) -> Result<Value> {
    match (exp, mantissa) {
        (8, 24) => Ok(Value::Float(input.read_f32()? as f64)),
        (11, 53) => Ok(Value::Float(input.read_f64()?)),
        _ => Err(FracpackError::UnsupportedFloat { exp, mantissa }),
    }
}
