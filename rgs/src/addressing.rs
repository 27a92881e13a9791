//! Opcode table and operand address resolution

use crate::{
    backend::Backend,
    device::{Addr24, Device, Wrap},
    timing::Cycles,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddrMode {
    Implied,
    Accumulator,
    /// `#const`, one or two bytes depending on the M flag
    ImmediateM,
    /// `#const`, one or two bytes depending on the X flag
    ImmediateX,
    /// `#const`, always one byte (`REP`, `SEP`, `BRK` and `COP` signatures)
    Immediate8,
    Relative,
    RelativeLong,
    Absolute,
    AbsoluteX,
    AbsoluteY,
    AbsoluteLong,
    AbsoluteLongX,
    /// `(a)`
    AbsoluteIndirect,
    /// `[a]`
    AbsoluteIndirectLong,
    /// `(a,x)`
    AbsoluteXIndirect,
    Direct,
    DirectX,
    DirectY,
    /// `(d)`
    DirectIndirect,
    /// `[d]`
    DirectIndirectLong,
    /// `(d,x)`
    DirectXIndirect,
    /// `(d),y`
    DirectIndirectY,
    /// `[d],y`
    DirectIndirectLongY,
    /// `d,s`
    StackRelative,
    /// `(d,s),y`
    StackRelativeIndirectY,
    /// `srcbk,destbk`
    BlockMove,
}

impl AddrMode {
    /// Number of operand bytes following the opcode
    pub const fn operand_len(self, m8: bool, x8: bool) -> u16 {
        use AddrMode::*;
        match self {
            Implied | Accumulator => 0,
            ImmediateM => 2 - m8 as u16,
            ImmediateX => 2 - x8 as u16,
            Immediate8 | Relative | Direct | DirectX | DirectY | DirectIndirect
            | DirectIndirectLong | DirectXIndirect | DirectIndirectY | DirectIndirectLongY
            | StackRelative | StackRelativeIndirectY => 1,
            RelativeLong | Absolute | AbsoluteX | AbsoluteY | AbsoluteIndirect
            | AbsoluteIndirectLong | AbsoluteXIndirect | BlockMove => 2,
            AbsoluteLong | AbsoluteLongX => 3,
        }
    }
}

#[rustfmt::skip]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mnemonic {
    Adc, And, Asl, Bcc, Bcs, Beq, Bit, Bmi, Bne, Bpl, Bra, Brk, Brl, Bvc, Bvs, Clc,
    Cld, Cli, Clv, Cmp, Cop, Cpx, Cpy, Dec, Dex, Dey, Eor, Inc, Inx, Iny, Jml, Jmp,
    Jsl, Jsr, Lda, Ldx, Ldy, Lsr, Mvn, Mvp, Nop, Ora, Pea, Pei, Per, Pha, Phb, Phd,
    Phk, Php, Phx, Phy, Pla, Plb, Pld, Plp, Plx, Ply, Rep, Rol, Ror, Rti, Rtl, Rts,
    Sbc, Sec, Sed, Sei, Sep, Sta, Stp, Stx, Sty, Stz, Tax, Tay, Tcd, Tcs, Tdc, Trb,
    Tsb, Tsc, Tsx, Txa, Txs, Txy, Tya, Tyx, Wai, Wdm, Xba, Xce,
}

impl std::fmt::Display for Mnemonic {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let name = format!("{:?}", self);
        f.write_str(&name.to_ascii_uppercase())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Opcode {
    pub mnemonic: Mnemonic,
    pub mode: AddrMode,
    /// Cost with 8-bit registers, a page aligned direct page and no
    /// page crossing
    pub cycles: Cycles,
}

macro_rules! op {
    ($mn:ident, $mode:ident, $cycles:expr) => {
        Opcode {
            mnemonic: Mnemonic::$mn,
            mode: AddrMode::$mode,
            cycles: $cycles,
        }
    };
}

#[rustfmt::skip]
pub static OPCODES: [Opcode; 256] = [
    // 0^
    op!(Brk, Immediate8, 7), op!(Ora, DirectXIndirect, 6), op!(Cop, Immediate8, 7), op!(Ora, StackRelative, 4),
    op!(Tsb, Direct, 5), op!(Ora, Direct, 3), op!(Asl, Direct, 5), op!(Ora, DirectIndirectLong, 6),
    op!(Php, Implied, 3), op!(Ora, ImmediateM, 2), op!(Asl, Accumulator, 2), op!(Phd, Implied, 4),
    op!(Tsb, Absolute, 6), op!(Ora, Absolute, 4), op!(Asl, Absolute, 6), op!(Ora, AbsoluteLong, 5),
    // 1^
    op!(Bpl, Relative, 2), op!(Ora, DirectIndirectY, 5), op!(Ora, DirectIndirect, 5), op!(Ora, StackRelativeIndirectY, 7),
    op!(Trb, Direct, 5), op!(Ora, DirectX, 4), op!(Asl, DirectX, 6), op!(Ora, DirectIndirectLongY, 6),
    op!(Clc, Implied, 2), op!(Ora, AbsoluteY, 4), op!(Inc, Accumulator, 2), op!(Tcs, Implied, 2),
    op!(Trb, Absolute, 6), op!(Ora, AbsoluteX, 4), op!(Asl, AbsoluteX, 7), op!(Ora, AbsoluteLongX, 5),
    // 2^
    op!(Jsr, Absolute, 6), op!(And, DirectXIndirect, 6), op!(Jsl, AbsoluteLong, 8), op!(And, StackRelative, 4),
    op!(Bit, Direct, 3), op!(And, Direct, 3), op!(Rol, Direct, 5), op!(And, DirectIndirectLong, 6),
    op!(Plp, Implied, 4), op!(And, ImmediateM, 2), op!(Rol, Accumulator, 2), op!(Pld, Implied, 5),
    op!(Bit, Absolute, 4), op!(And, Absolute, 4), op!(Rol, Absolute, 6), op!(And, AbsoluteLong, 5),
    // 3^
    op!(Bmi, Relative, 2), op!(And, DirectIndirectY, 5), op!(And, DirectIndirect, 5), op!(And, StackRelativeIndirectY, 7),
    op!(Bit, DirectX, 4), op!(And, DirectX, 4), op!(Rol, DirectX, 6), op!(And, DirectIndirectLongY, 6),
    op!(Sec, Implied, 2), op!(And, AbsoluteY, 4), op!(Dec, Accumulator, 2), op!(Tsc, Implied, 2),
    op!(Bit, AbsoluteX, 4), op!(And, AbsoluteX, 4), op!(Rol, AbsoluteX, 7), op!(And, AbsoluteLongX, 5),
    // 4^
    op!(Rti, Implied, 6), op!(Eor, DirectXIndirect, 6), op!(Wdm, Immediate8, 2), op!(Eor, StackRelative, 4),
    op!(Mvp, BlockMove, 7), op!(Eor, Direct, 3), op!(Lsr, Direct, 5), op!(Eor, DirectIndirectLong, 6),
    op!(Pha, Implied, 3), op!(Eor, ImmediateM, 2), op!(Lsr, Accumulator, 2), op!(Phk, Implied, 3),
    op!(Jmp, Absolute, 3), op!(Eor, Absolute, 4), op!(Lsr, Absolute, 6), op!(Eor, AbsoluteLong, 5),
    // 5^
    op!(Bvc, Relative, 2), op!(Eor, DirectIndirectY, 5), op!(Eor, DirectIndirect, 5), op!(Eor, StackRelativeIndirectY, 7),
    op!(Mvn, BlockMove, 7), op!(Eor, DirectX, 4), op!(Lsr, DirectX, 6), op!(Eor, DirectIndirectLongY, 6),
    op!(Cli, Implied, 2), op!(Eor, AbsoluteY, 4), op!(Phy, Implied, 3), op!(Tcd, Implied, 2),
    op!(Jml, AbsoluteLong, 4), op!(Eor, AbsoluteX, 4), op!(Lsr, AbsoluteX, 7), op!(Eor, AbsoluteLongX, 5),
    // 6^
    op!(Rts, Implied, 6), op!(Adc, DirectXIndirect, 6), op!(Per, RelativeLong, 6), op!(Adc, StackRelative, 4),
    op!(Stz, Direct, 3), op!(Adc, Direct, 3), op!(Ror, Direct, 5), op!(Adc, DirectIndirectLong, 6),
    op!(Pla, Implied, 4), op!(Adc, ImmediateM, 2), op!(Ror, Accumulator, 2), op!(Rtl, Implied, 6),
    op!(Jmp, AbsoluteIndirect, 5), op!(Adc, Absolute, 4), op!(Ror, Absolute, 6), op!(Adc, AbsoluteLong, 5),
    // 7^
    op!(Bvs, Relative, 2), op!(Adc, DirectIndirectY, 5), op!(Adc, DirectIndirect, 5), op!(Adc, StackRelativeIndirectY, 7),
    op!(Stz, DirectX, 4), op!(Adc, DirectX, 4), op!(Ror, DirectX, 6), op!(Adc, DirectIndirectLongY, 6),
    op!(Sei, Implied, 2), op!(Adc, AbsoluteY, 4), op!(Ply, Implied, 4), op!(Tdc, Implied, 2),
    op!(Jmp, AbsoluteXIndirect, 6), op!(Adc, AbsoluteX, 4), op!(Ror, AbsoluteX, 7), op!(Adc, AbsoluteLongX, 5),
    // 8^
    op!(Bra, Relative, 2), op!(Sta, DirectXIndirect, 6), op!(Brl, RelativeLong, 4), op!(Sta, StackRelative, 4),
    op!(Sty, Direct, 3), op!(Sta, Direct, 3), op!(Stx, Direct, 3), op!(Sta, DirectIndirectLong, 6),
    op!(Dey, Implied, 2), op!(Bit, ImmediateM, 2), op!(Txa, Implied, 2), op!(Phb, Implied, 3),
    op!(Sty, Absolute, 4), op!(Sta, Absolute, 4), op!(Stx, Absolute, 4), op!(Sta, AbsoluteLong, 5),
    // 9^
    op!(Bcc, Relative, 2), op!(Sta, DirectIndirectY, 6), op!(Sta, DirectIndirect, 5), op!(Sta, StackRelativeIndirectY, 7),
    op!(Sty, DirectX, 4), op!(Sta, DirectX, 4), op!(Stx, DirectY, 4), op!(Sta, DirectIndirectLongY, 6),
    op!(Tya, Implied, 2), op!(Sta, AbsoluteY, 5), op!(Txs, Implied, 2), op!(Txy, Implied, 2),
    op!(Stz, Absolute, 4), op!(Sta, AbsoluteX, 5), op!(Stz, AbsoluteX, 5), op!(Sta, AbsoluteLongX, 5),
    // a^
    op!(Ldy, ImmediateX, 2), op!(Lda, DirectXIndirect, 6), op!(Ldx, ImmediateX, 2), op!(Lda, StackRelative, 4),
    op!(Ldy, Direct, 3), op!(Lda, Direct, 3), op!(Ldx, Direct, 3), op!(Lda, DirectIndirectLong, 6),
    op!(Tay, Implied, 2), op!(Lda, ImmediateM, 2), op!(Tax, Implied, 2), op!(Plb, Implied, 4),
    op!(Ldy, Absolute, 4), op!(Lda, Absolute, 4), op!(Ldx, Absolute, 4), op!(Lda, AbsoluteLong, 5),
    // b^
    op!(Bcs, Relative, 2), op!(Lda, DirectIndirectY, 5), op!(Lda, DirectIndirect, 5), op!(Lda, StackRelativeIndirectY, 7),
    op!(Ldy, DirectX, 4), op!(Lda, DirectX, 4), op!(Ldx, DirectY, 4), op!(Lda, DirectIndirectLongY, 6),
    op!(Clv, Implied, 2), op!(Lda, AbsoluteY, 4), op!(Tsx, Implied, 2), op!(Tyx, Implied, 2),
    op!(Ldy, AbsoluteX, 4), op!(Lda, AbsoluteX, 4), op!(Ldx, AbsoluteY, 4), op!(Lda, AbsoluteLongX, 5),
    // c^
    op!(Cpy, ImmediateX, 2), op!(Cmp, DirectXIndirect, 6), op!(Rep, Immediate8, 3), op!(Cmp, StackRelative, 4),
    op!(Cpy, Direct, 3), op!(Cmp, Direct, 3), op!(Dec, Direct, 5), op!(Cmp, DirectIndirectLong, 6),
    op!(Iny, Implied, 2), op!(Cmp, ImmediateM, 2), op!(Dex, Implied, 2), op!(Wai, Implied, 3),
    op!(Cpy, Absolute, 4), op!(Cmp, Absolute, 4), op!(Dec, Absolute, 6), op!(Cmp, AbsoluteLong, 5),
    // d^
    op!(Bne, Relative, 2), op!(Cmp, DirectIndirectY, 5), op!(Cmp, DirectIndirect, 5), op!(Cmp, StackRelativeIndirectY, 7),
    op!(Pei, DirectIndirect, 6), op!(Cmp, DirectX, 4), op!(Dec, DirectX, 6), op!(Cmp, DirectIndirectLongY, 6),
    op!(Cld, Implied, 2), op!(Cmp, AbsoluteY, 4), op!(Phx, Implied, 3), op!(Stp, Implied, 3),
    op!(Jml, AbsoluteIndirectLong, 6), op!(Cmp, AbsoluteX, 4), op!(Dec, AbsoluteX, 7), op!(Cmp, AbsoluteLongX, 5),
    // e^
    op!(Cpx, ImmediateX, 2), op!(Sbc, DirectXIndirect, 6), op!(Sep, Immediate8, 3), op!(Sbc, StackRelative, 4),
    op!(Cpx, Direct, 3), op!(Sbc, Direct, 3), op!(Inc, Direct, 5), op!(Sbc, DirectIndirectLong, 6),
    op!(Inx, Implied, 2), op!(Sbc, ImmediateM, 2), op!(Nop, Implied, 2), op!(Xba, Implied, 3),
    op!(Cpx, Absolute, 4), op!(Sbc, Absolute, 4), op!(Inc, Absolute, 6), op!(Sbc, AbsoluteLong, 5),
    // f^
    op!(Beq, Relative, 2), op!(Sbc, DirectIndirectY, 5), op!(Sbc, DirectIndirect, 5), op!(Sbc, StackRelativeIndirectY, 7),
    op!(Pea, Absolute, 5), op!(Sbc, DirectX, 4), op!(Inc, DirectX, 6), op!(Sbc, DirectIndirectLongY, 6),
    op!(Sed, Implied, 2), op!(Sbc, AbsoluteY, 4), op!(Plx, Implied, 4), op!(Xce, Implied, 2),
    op!(Jsr, AbsoluteXIndirect, 8), op!(Sbc, AbsoluteX, 4), op!(Inc, AbsoluteX, 7), op!(Sbc, AbsoluteLongX, 5),
];

/// Where an instruction finds its data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    Accumulator,
    Memory(Addr24, Wrap),
}

/// How an instruction uses its operand, which decides the indexing penalty
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read,
    Write,
    Modify,
}

impl<B: Backend> Device<B> {
    /// Direct page offset fetched from the instruction stream
    fn load_direct_offset(&mut self, cycles: &mut Cycles) -> u16 {
        let offset = self.load::<u8>();
        if self.cpu.regs.dl() != 0 {
            *cycles += 1
        }
        offset.into()
    }

    /// Direct page address `D + offset + index`. In emulation mode with
    /// a page aligned direct page the indexing wraps within the page.
    fn direct_address(&self, offset: u16, index: u16) -> Addr24 {
        let dp = self.cpu.regs.dp;
        if self.cpu.regs.is_emulation && self.cpu.regs.dl() == 0 {
            Addr24::new(0, dp | (offset.wrapping_add(index) & 0xff))
        } else {
            Addr24::new(0, dp.wrapping_add(offset).wrapping_add(index))
        }
    }

    /// How multi-byte direct page pointers wrap
    fn direct_wrap(&self) -> Wrap {
        if self.cpu.regs.is_emulation && self.cpu.regs.dl() == 0 {
            Wrap::Page
        } else {
            Wrap::Bank
        }
    }

    /// Add an index to a data bank address, with the read penalty for
    /// page crossing or 16-bit indices
    fn index_data(
        &self,
        base: Addr24,
        index: u16,
        access: Access,
        x8: bool,
        cycles: &mut Cycles,
    ) -> Addr24 {
        let addr = base.offset(index, Wrap::Linear);
        if access == Access::Read && (!x8 || (base.addr & 0xff00) != (addr.addr & 0xff00)) {
            *cycles += 1
        }
        addr
    }

    /// Resolve the data operand of an instruction, fetching the operand
    /// bytes from the instruction stream
    pub fn resolve(
        &mut self,
        mode: AddrMode,
        access: Access,
        m8: bool,
        x8: bool,
        cycles: &mut Cycles,
    ) -> Operand {
        use AddrMode::*;
        let (x, y) = (self.cpu.regs.x, self.cpu.regs.y);
        let addr = match mode {
            Accumulator => return Operand::Accumulator,
            ImmediateM | ImmediateX | Immediate8 => {
                let pc = self.cpu.regs.pc;
                let len = mode.operand_len(m8, x8);
                self.cpu.regs.pc.addr = pc.addr.wrapping_add(len);
                return Operand::Memory(pc, Wrap::Bank);
            }
            Absolute => {
                let addr = self.load::<u16>();
                self.cpu.get_data_addr(addr)
            }
            AbsoluteX => {
                let addr = self.load::<u16>();
                let base = self.cpu.get_data_addr(addr);
                self.index_data(base, x, access, x8, cycles)
            }
            AbsoluteY => {
                let addr = self.load::<u16>();
                let base = self.cpu.get_data_addr(addr);
                self.index_data(base, y, access, x8, cycles)
            }
            AbsoluteLong => self.load::<Addr24>(),
            AbsoluteLongX => self.load::<Addr24>().offset(x, Wrap::Linear),
            Direct => {
                let offset = self.load_direct_offset(cycles);
                return Operand::Memory(self.direct_address(offset, 0), Wrap::Bank);
            }
            DirectX | DirectY => {
                let offset = self.load_direct_offset(cycles);
                let index = if mode == DirectX { x } else { y };
                return Operand::Memory(self.direct_address(offset, index), Wrap::Bank);
            }
            DirectIndirect => {
                let offset = self.load_direct_offset(cycles);
                let ptr = self.direct_address(offset, 0);
                let addr = self.read::<u16>(ptr, self.direct_wrap());
                self.cpu.get_data_addr(addr)
            }
            DirectXIndirect => {
                let offset = self.load_direct_offset(cycles);
                let ptr = self.direct_address(offset, x);
                let addr = self.read::<u16>(ptr, self.direct_wrap());
                self.cpu.get_data_addr(addr)
            }
            DirectIndirectY => {
                let offset = self.load_direct_offset(cycles);
                let ptr = self.direct_address(offset, 0);
                let base = self.read::<u16>(ptr, self.direct_wrap());
                let base = self.cpu.get_data_addr(base);
                self.index_data(base, y, access, x8, cycles)
            }
            DirectIndirectLong => {
                let offset = self.load_direct_offset(cycles);
                let ptr = self.direct_address(offset, 0);
                self.read::<Addr24>(ptr, Wrap::Bank)
            }
            DirectIndirectLongY => {
                let offset = self.load_direct_offset(cycles);
                let ptr = self.direct_address(offset, 0);
                self.read::<Addr24>(ptr, Wrap::Bank).offset(y, Wrap::Linear)
            }
            StackRelative => {
                let offset = self.load::<u8>();
                let addr = self.cpu.regs.sp.wrapping_add(offset.into());
                return Operand::Memory(Addr24::new(0, addr), Wrap::Bank);
            }
            StackRelativeIndirectY => {
                let offset = self.load::<u8>();
                let ptr = Addr24::new(0, self.cpu.regs.sp.wrapping_add(offset.into()));
                let base = self.read::<u16>(ptr, Wrap::Bank);
                self.cpu.get_data_addr(base).offset(y, Wrap::Linear)
            }
            Implied | Relative | RelativeLong | AbsoluteIndirect | AbsoluteIndirectLong
            | AbsoluteXIndirect | BlockMove => {
                debug_assert!(false, "{:?} has no data operand", mode);
                return Operand::Accumulator;
            }
        };
        Operand::Memory(addr, Wrap::Linear)
    }

    /// Read an operand of `wide` (16-bit) or 8-bit width
    pub fn read_operand(&mut self, operand: Operand, wide: bool) -> u16 {
        match (operand, wide) {
            (Operand::Accumulator, true) => self.cpu.regs.a,
            (Operand::Accumulator, false) => self.cpu.regs.a8().into(),
            (Operand::Memory(addr, wrap), true) => self.read::<u16>(addr, wrap),
            (Operand::Memory(addr, wrap), false) => self.read::<u8>(addr, wrap).into(),
        }
    }

    /// Write an operand; 8-bit writes to the accumulator keep its high byte
    pub fn write_operand(&mut self, operand: Operand, value: u16, wide: bool) {
        match (operand, wide) {
            (Operand::Accumulator, true) => self.cpu.regs.a = value,
            (Operand::Accumulator, false) => self.cpu.regs.set_a8(value as u8),
            (Operand::Memory(addr, wrap), true) => self.write::<u16>(addr, value, wrap),
            (Operand::Memory(addr, wrap), false) => self.write::<u8>(addr, value as u8, wrap),
        }
    }
}
