//! Addition and subtraction with carry, in binary and decimal mode
//!
//! The decimal algorithm corrects each nibble after it has been added and
//! works on two digits in 8-bit mode and four digits in 16-bit mode. It
//! matches the hardware for invalid BCD operands, too.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AluResult {
    pub value: u16,
    pub carry: bool,
    pub overflow: bool,
}

/// `ADC`: `a + b + carry`
pub fn add(a: u16, b: u16, carry: bool, decimal: bool, wide: bool) -> AluResult {
    add_with(a, b, carry, decimal, wide, false)
}

/// `SBC`: `a - b - !carry`, carry clear meaning borrow
pub fn sub(a: u16, b: u16, carry: bool, decimal: bool, wide: bool) -> AluResult {
    add_with(a, b, carry, decimal, wide, true)
}

fn correct(result: i32, shift: u32, subtract: bool) -> i32 {
    if subtract {
        if result <= (0x10 << shift) - 1 {
            result - (0x6 << shift)
        } else {
            result
        }
    } else if result > (0xa << shift) - 1 {
        result + (0x6 << shift)
    } else {
        result
    }
}

fn add_with(a: u16, b: u16, carry: bool, decimal: bool, wide: bool, subtract: bool) -> AluResult {
    let mask: i32 = if wide { 0xffff } else { 0xff };
    let a = i32::from(a) & mask;
    let data = if subtract { !i32::from(b) & mask } else { i32::from(b) & mask };
    let digits = if wide { 4 } else { 2 };

    let result = if decimal {
        let mut result = 0;
        let mut carry = i32::from(carry);
        for digit in 0..digits {
            let shift = 4 * digit;
            let nibble = 0xf << shift;
            result = (a & nibble) + (data & nibble) + (carry << shift) + (result & ((1 << shift) - 1));
            if digit + 1 < digits {
                result = correct(result, shift, subtract);
                carry = i32::from(result > (0x10 << shift) - 1);
            }
        }
        result
    } else {
        a + data + i32::from(carry)
    };

    let sign = (mask + 1) >> 1;
    let overflow = !(a ^ data) & (a ^ result) & sign != 0;
    let result = if decimal {
        correct(result, 4 * (digits - 1), subtract)
    } else {
        result
    };
    AluResult {
        value: (result & mask) as u16,
        carry: result > mask,
        overflow,
    }
}
