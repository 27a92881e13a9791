//! The instruction engine
//!
//! The five combinations of the E, M and X flags each get their own
//! monomorphised copy of [`Device::execute`], so register widths are
//! compile time constants inside every instruction body.

use crate::{
    addressing::{Access, AddrMode, Mnemonic, Operand, OPCODES},
    alu,
    backend::Backend,
    cpu::{Cpu, Mode, Status},
    device::{Addr24, Device, Wrap},
    interrupt::Vector,
    timing::{Cycles, RunState},
};

const fn sign_bit(wide: bool) -> u16 {
    if wide {
        0x8000
    } else {
        0x80
    }
}

const fn width_mask(wide: bool) -> u16 {
    if wide {
        0xffff
    } else {
        0xff
    }
}

impl<B: Backend> Device<B> {
    /// Fetch, decode and execute the next instruction
    pub fn dispatch_instruction(&mut self) -> Cycles {
        let start = self.cpu.regs.pc;
        let op = self.load::<u8>();
        match self.cpu.mode() {
            Mode::Emulation => self.execute::<true, true, true>(start, op),
            Mode::M8X8 => self.execute::<false, true, true>(start, op),
            Mode::M8X16 => self.execute::<false, true, false>(start, op),
            Mode::M16X8 => self.execute::<false, false, true>(start, op),
            Mode::M16X16 => self.execute::<false, false, false>(start, op),
        }
    }

    fn fetch<const M8: bool, const X8: bool>(
        &mut self,
        mode: AddrMode,
        wide: bool,
        cycles: &mut Cycles,
    ) -> u16 {
        let operand = self.resolve(mode, Access::Read, M8, X8, cycles);
        self.read_operand(operand, wide)
    }

    fn store<const M8: bool, const X8: bool>(
        &mut self,
        mode: AddrMode,
        value: u16,
        wide: bool,
        cycles: &mut Cycles,
    ) {
        let operand = self.resolve(mode, Access::Write, M8, X8, cycles);
        self.write_operand(operand, value, wide)
    }

    /// Read-modify-write on memory or the accumulator with `M` width.
    /// `f` computes the result and updates the flags.
    fn modify<const M8: bool, const X8: bool>(
        &mut self,
        mode: AddrMode,
        cycles: &mut Cycles,
        f: impl FnOnce(&mut Cpu, u16) -> u16,
    ) {
        let operand = self.resolve(mode, Access::Modify, M8, X8, cycles);
        if !M8 && operand != Operand::Accumulator {
            *cycles += 2
        }
        let value = self.read_operand(operand, !M8);
        let result = f(&mut self.cpu, value);
        self.write_operand(operand, result, !M8)
    }

    fn accumulator(&self, wide: bool) -> u16 {
        self.cpu.regs.a & width_mask(wide)
    }

    fn set_accumulator(&mut self, value: u16, wide: bool) {
        if wide {
            self.cpu.regs.a = value
        } else {
            self.cpu.regs.set_a8(value as u8)
        }
        self.cpu.update_nz(value, wide)
    }

    fn set_x(&mut self, value: u16, wide: bool) {
        self.cpu.regs.x = value & width_mask(wide);
        self.cpu.update_nz(value, wide)
    }

    fn set_y(&mut self, value: u16, wide: bool) {
        self.cpu.regs.y = value & width_mask(wide);
        self.cpu.update_nz(value, wide)
    }

    fn compare(&mut self, reg: u16, value: u16, wide: bool) {
        let mask = width_mask(wide);
        let (reg, value) = (reg & mask, value & mask);
        self.cpu.regs.status.set_if(Status::CARRY, reg >= value);
        self.cpu.update_nz(reg.wrapping_sub(value), wide)
    }

    fn apply_alu(&mut self, result: alu::AluResult, wide: bool) {
        self.cpu.regs.status.set_if(Status::CARRY, result.carry);
        self.cpu.regs.status.set_if(Status::OVERFLOW, result.overflow);
        self.set_accumulator(result.value, wide)
    }

    pub fn branch_near<const E: bool>(&mut self, cond: bool, cycles: &mut Cycles) {
        let rel = self.load::<u8>() as i8;
        if cond {
            *cycles += 1;
            let new = self.cpu.regs.pc.addr.wrapping_add(rel as i16 as u16);
            let old = core::mem::replace(&mut self.cpu.regs.pc.addr, new);
            if E && old & 0xff00 != new & 0xff00 {
                *cycles += 1
            }
        }
    }

    fn execute<const E: bool, const M8: bool, const X8: bool>(
        &mut self,
        start: Addr24,
        op: u8,
    ) -> Cycles {
        let opcode = OPCODES[op as usize];
        log::trace!("{} ${:02x} {:?} @ {}", opcode.mnemonic, op, opcode.mode, start);
        let mode = opcode.mode;
        let mut cycles = opcode.cycles;
        let m16 = Cycles::from(!M8);
        let x16 = Cycles::from(!X8);
        let status = self.cpu.regs.status;
        let carry = status.has(Status::CARRY);
        let decimal = status.has(Status::DECIMAL);
        match opcode.mnemonic {
            Mnemonic::Lda => {
                // LDA - Load Accumulator from Memory
                let value = self.fetch::<M8, X8>(mode, !M8, &mut cycles);
                self.set_accumulator(value, !M8);
                cycles += m16
            }
            Mnemonic::Ldx => {
                // LDX - Load Index Register X from Memory
                let value = self.fetch::<M8, X8>(mode, !X8, &mut cycles);
                self.set_x(value, !X8);
                cycles += x16
            }
            Mnemonic::Ldy => {
                // LDY - Load Index Register Y from Memory
                let value = self.fetch::<M8, X8>(mode, !X8, &mut cycles);
                self.set_y(value, !X8);
                cycles += x16
            }
            Mnemonic::Sta => {
                // STA - Store Accumulator to Memory
                let value = self.cpu.regs.a;
                self.store::<M8, X8>(mode, value, !M8, &mut cycles);
                cycles += m16
            }
            Mnemonic::Stx => {
                // STX - Store Index Register X to Memory
                let value = self.cpu.regs.x;
                self.store::<M8, X8>(mode, value, !X8, &mut cycles);
                cycles += x16
            }
            Mnemonic::Sty => {
                // STY - Store Index Register Y to Memory
                let value = self.cpu.regs.y;
                self.store::<M8, X8>(mode, value, !X8, &mut cycles);
                cycles += x16
            }
            Mnemonic::Stz => {
                // STZ - Store Zero to Memory
                self.store::<M8, X8>(mode, 0, !M8, &mut cycles);
                cycles += m16
            }
            Mnemonic::Adc => {
                // ADC - Add with Carry
                let value = self.fetch::<M8, X8>(mode, !M8, &mut cycles);
                let result = alu::add(self.accumulator(!M8), value, carry, decimal, !M8);
                self.apply_alu(result, !M8);
                cycles += m16
            }
            Mnemonic::Sbc => {
                // SBC - Subtract with Borrow from Accumulator
                let value = self.fetch::<M8, X8>(mode, !M8, &mut cycles);
                let result = alu::sub(self.accumulator(!M8), value, carry, decimal, !M8);
                self.apply_alu(result, !M8);
                cycles += m16
            }
            Mnemonic::Cmp => {
                // CMP - Compare Accumulator with Memory
                let value = self.fetch::<M8, X8>(mode, !M8, &mut cycles);
                self.compare(self.cpu.regs.a, value, !M8);
                cycles += m16
            }
            Mnemonic::Cpx => {
                // CPX - Compare Index Register X with Memory
                let value = self.fetch::<M8, X8>(mode, !X8, &mut cycles);
                self.compare(self.cpu.regs.x, value, !X8);
                cycles += x16
            }
            Mnemonic::Cpy => {
                // CPY - Compare Index Register Y with Memory
                let value = self.fetch::<M8, X8>(mode, !X8, &mut cycles);
                self.compare(self.cpu.regs.y, value, !X8);
                cycles += x16
            }
            Mnemonic::And | Mnemonic::Ora | Mnemonic::Eor => {
                // AND/ORA/EOR - bitwise operation on A with memory
                let value = self.fetch::<M8, X8>(mode, !M8, &mut cycles);
                let a = self.accumulator(!M8);
                let result = match opcode.mnemonic {
                    Mnemonic::And => a & value,
                    Mnemonic::Ora => a | value,
                    _ => a ^ value,
                };
                self.set_accumulator(result, !M8);
                cycles += m16
            }
            Mnemonic::Bit => {
                // BIT - Test Memory Bits against Accumulator
                let value = self.fetch::<M8, X8>(mode, !M8, &mut cycles);
                let regs = &mut self.cpu.regs;
                regs.status.set_if(Status::ZERO, regs.a & value & width_mask(!M8) == 0);
                // the immediate form only touches Z
                if mode != AddrMode::ImmediateM {
                    let sign = sign_bit(!M8);
                    regs.status.set_if(Status::NEGATIVE, value & sign != 0);
                    regs.status.set_if(Status::OVERFLOW, value & (sign >> 1) != 0);
                }
                cycles += m16
            }
            Mnemonic::Asl => {
                // ASL - Shift Left
                self.modify::<M8, X8>(mode, &mut cycles, |cpu, value| {
                    let result = (value << 1) & width_mask(!M8);
                    cpu.regs.status.set_if(Status::CARRY, value & sign_bit(!M8) != 0);
                    cpu.update_nz(result, !M8);
                    result
                })
            }
            Mnemonic::Lsr => {
                // LSR - Shift Right
                self.modify::<M8, X8>(mode, &mut cycles, |cpu, value| {
                    let result = value >> 1;
                    cpu.regs.status.set_if(Status::CARRY, value & 1 != 0);
                    cpu.update_nz(result, !M8);
                    result
                })
            }
            Mnemonic::Rol => {
                // ROL - Rotate Left
                self.modify::<M8, X8>(mode, &mut cycles, |cpu, value| {
                    let result = ((value << 1) | carry as u16) & width_mask(!M8);
                    cpu.regs.status.set_if(Status::CARRY, value & sign_bit(!M8) != 0);
                    cpu.update_nz(result, !M8);
                    result
                })
            }
            Mnemonic::Ror => {
                // ROR - Rotate Right
                self.modify::<M8, X8>(mode, &mut cycles, |cpu, value| {
                    let result = (value >> 1) | if carry { sign_bit(!M8) } else { 0 };
                    cpu.regs.status.set_if(Status::CARRY, value & 1 != 0);
                    cpu.update_nz(result, !M8);
                    result
                })
            }
            Mnemonic::Inc | Mnemonic::Dec => {
                // INC/DEC - Increment or Decrement
                let step = if opcode.mnemonic == Mnemonic::Inc { 1 } else { 0xffff };
                self.modify::<M8, X8>(mode, &mut cycles, |cpu, value| {
                    let result = value.wrapping_add(step) & width_mask(!M8);
                    cpu.update_nz(result, !M8);
                    result
                })
            }
            Mnemonic::Tsb | Mnemonic::Trb => {
                // TSB/TRB - Test and Set/Reset Memory Bits against Accumulator
                let a = self.accumulator(!M8);
                let set = opcode.mnemonic == Mnemonic::Tsb;
                self.modify::<M8, X8>(mode, &mut cycles, |cpu, value| {
                    cpu.regs.status.set_if(Status::ZERO, a & value == 0);
                    if set {
                        value | a
                    } else {
                        value & !a
                    }
                })
            }
            Mnemonic::Inx => {
                // INX - Increment Index Register X
                self.set_x(self.cpu.regs.x.wrapping_add(1), !X8)
            }
            Mnemonic::Iny => {
                // INY - Increment Index Register Y
                self.set_y(self.cpu.regs.y.wrapping_add(1), !X8)
            }
            Mnemonic::Dex => {
                // DEX - Decrement Index Register X
                self.set_x(self.cpu.regs.x.wrapping_sub(1), !X8)
            }
            Mnemonic::Dey => {
                // DEY - Decrement Index Register Y
                self.set_y(self.cpu.regs.y.wrapping_sub(1), !X8)
            }
            Mnemonic::Bpl => self.branch_near::<E>(!status.has(Status::NEGATIVE), &mut cycles),
            Mnemonic::Bmi => self.branch_near::<E>(status.has(Status::NEGATIVE), &mut cycles),
            Mnemonic::Bvc => self.branch_near::<E>(!status.has(Status::OVERFLOW), &mut cycles),
            Mnemonic::Bvs => self.branch_near::<E>(status.has(Status::OVERFLOW), &mut cycles),
            Mnemonic::Bcc => self.branch_near::<E>(!carry, &mut cycles),
            Mnemonic::Bcs => self.branch_near::<E>(carry, &mut cycles),
            Mnemonic::Bne => self.branch_near::<E>(!status.has(Status::ZERO), &mut cycles),
            Mnemonic::Beq => self.branch_near::<E>(status.has(Status::ZERO), &mut cycles),
            Mnemonic::Bra => self.branch_near::<E>(true, &mut cycles),
            Mnemonic::Brl => {
                // BRL - Branch Always Long
                let rel = self.load::<u16>();
                self.cpu.regs.pc.addr = self.cpu.regs.pc.addr.wrapping_add(rel)
            }
            Mnemonic::Jmp => {
                // JMP - Jump
                let operand = self.load::<u16>();
                self.cpu.regs.pc.addr = match mode {
                    AddrMode::AbsoluteIndirect => self.read(Addr24::new(0, operand), Wrap::Bank),
                    AddrMode::AbsoluteXIndirect => {
                        let ptr = operand.wrapping_add(self.cpu.regs.x);
                        self.read(Addr24::new(self.cpu.regs.pc.bank, ptr), Wrap::Bank)
                    }
                    _ => operand,
                }
            }
            Mnemonic::Jml => {
                // JML - Jump Long
                self.cpu.regs.pc = if mode == AddrMode::AbsoluteIndirectLong {
                    let ptr = self.load::<u16>();
                    self.read(Addr24::new(0, ptr), Wrap::Bank)
                } else {
                    self.load::<Addr24>()
                }
            }
            Mnemonic::Jsr => {
                // JSR - Jump to Subroutine
                let operand = self.load::<u16>();
                self.push(self.cpu.regs.pc.addr.wrapping_sub(1));
                self.cpu.regs.pc.addr = if mode == AddrMode::AbsoluteXIndirect {
                    let ptr = operand.wrapping_add(self.cpu.regs.x);
                    self.read(Addr24::new(self.cpu.regs.pc.bank, ptr), Wrap::Bank)
                } else {
                    operand
                }
            }
            Mnemonic::Jsl => {
                // JSL - Jump to Subroutine Long
                let target = self.load::<Addr24>();
                self.push(self.cpu.regs.pc.bank);
                self.push(self.cpu.regs.pc.addr.wrapping_sub(1));
                self.cpu.regs.pc = target
            }
            Mnemonic::Rts => {
                // RTS - Return from Subroutine
                self.cpu.regs.pc.addr = self.pull::<u16>().wrapping_add(1)
            }
            Mnemonic::Rtl => {
                // RTL - Return from Subroutine Long
                let addr = self.pull::<u16>().wrapping_add(1);
                let bank = self.pull::<u8>();
                self.cpu.regs.pc = Addr24::new(bank, addr)
            }
            Mnemonic::Rti => {
                // RTI - Return from Interrupt
                let status = self.pull::<u8>();
                self.cpu.set_status(status);
                self.cpu.regs.pc.addr = self.pull();
                if !E {
                    self.cpu.regs.pc.bank = self.pull();
                    cycles += 1
                }
            }
            Mnemonic::Brk | Mnemonic::Cop => {
                // BRK/COP - Software Interrupt
                let _signature = self.load::<u8>();
                let vector = if opcode.mnemonic == Mnemonic::Brk {
                    Vector::Brk
                } else {
                    Vector::Cop
                };
                self.enter_interrupt(vector);
                if !E {
                    cycles += 1
                }
            }
            Mnemonic::Mvn | Mnemonic::Mvp => {
                // MVN/MVP - Block Move Next/Previous, one byte per execution
                let dst = self.load::<u8>();
                let src = self.load::<u8>();
                self.cpu.regs.db = dst;
                let value = self.read_byte(Addr24::new(src, self.cpu.regs.x));
                self.write_byte(Addr24::new(dst, self.cpu.regs.y), value);
                let step = if opcode.mnemonic == Mnemonic::Mvn { 1 } else { 0xffff };
                let mask = width_mask(!X8);
                let regs = &mut self.cpu.regs;
                regs.x = regs.x.wrapping_add(step) & mask;
                regs.y = regs.y.wrapping_add(step) & mask;
                regs.a = regs.a.wrapping_sub(1);
                if regs.a != 0xffff {
                    regs.pc.addr = start.addr
                }
            }
            Mnemonic::Pea => {
                // PEA - Push Effective Absolute Address
                let value = self.load::<u16>();
                self.push(value)
            }
            Mnemonic::Pei => {
                // PEI - Push Effective Indirect Address
                let operand = self.resolve(mode, Access::Read, M8, X8, &mut cycles);
                if let Operand::Memory(addr, _) = operand {
                    self.push(addr.addr)
                }
            }
            Mnemonic::Per => {
                // PER - Push Effective PC Relative Indirect Address
                let rel = self.load::<u16>();
                self.push(self.cpu.regs.pc.addr.wrapping_add(rel))
            }
            Mnemonic::Pha => {
                // PHA - Push Accumulator
                if M8 {
                    self.push(self.cpu.regs.a8())
                } else {
                    self.push(self.cpu.regs.a)
                }
                cycles += m16
            }
            Mnemonic::Phx | Mnemonic::Phy => {
                // PHX/PHY - Push Index Register
                let value = if opcode.mnemonic == Mnemonic::Phx {
                    self.cpu.regs.x
                } else {
                    self.cpu.regs.y
                };
                if X8 {
                    self.push(value as u8)
                } else {
                    self.push(value)
                }
                cycles += x16
            }
            Mnemonic::Pla => {
                // PLA - Pull Accumulator
                let value = if M8 { self.pull::<u8>().into() } else { self.pull::<u16>() };
                self.set_accumulator(value, !M8);
                cycles += m16
            }
            Mnemonic::Plx => {
                // PLX - Pull Index Register X
                let value = if X8 { self.pull::<u8>().into() } else { self.pull::<u16>() };
                self.set_x(value, !X8);
                cycles += x16
            }
            Mnemonic::Ply => {
                // PLY - Pull Index Register Y
                let value = if X8 { self.pull::<u8>().into() } else { self.pull::<u16>() };
                self.set_y(value, !X8);
                cycles += x16
            }
            Mnemonic::Php => {
                // PHP - Push Status Register
                self.push(status.0)
            }
            Mnemonic::Plp => {
                // PLP - Pull Status Register
                let value = self.pull::<u8>();
                self.cpu.set_status(value)
            }
            Mnemonic::Phb => {
                // PHB - Push Data Bank Register
                self.push(self.cpu.regs.db)
            }
            Mnemonic::Plb => {
                // PLB - Pull Data Bank Register
                let value = self.pull::<u8>();
                self.cpu.regs.db = value;
                self.cpu.update_nz8(value)
            }
            Mnemonic::Phk => {
                // PHK - Push Program Bank Register
                self.push(self.cpu.regs.pc.bank)
            }
            Mnemonic::Phd => {
                // PHD - Push Direct Page Register
                self.push(self.cpu.regs.dp)
            }
            Mnemonic::Pld => {
                // PLD - Pull Direct Page Register
                let value = self.pull::<u16>();
                self.cpu.regs.dp = value;
                self.cpu.update_nz16(value)
            }
            Mnemonic::Tax => self.set_x(self.cpu.regs.a, !X8),
            Mnemonic::Tay => self.set_y(self.cpu.regs.a, !X8),
            Mnemonic::Txa => self.set_accumulator(self.cpu.regs.x, !M8),
            Mnemonic::Tya => self.set_accumulator(self.cpu.regs.y, !M8),
            Mnemonic::Txy => self.set_y(self.cpu.regs.x, !X8),
            Mnemonic::Tyx => self.set_x(self.cpu.regs.y, !X8),
            Mnemonic::Tsx => self.set_x(self.cpu.regs.sp, !X8),
            Mnemonic::Txs => {
                // TXS - Transfer X to Stack Pointer
                self.cpu.regs.sp = if E {
                    0x100 | (self.cpu.regs.x & 0xff)
                } else {
                    self.cpu.regs.x
                }
            }
            Mnemonic::Tcs => {
                // TCS - Transfer Accumulator to Stack Pointer
                self.cpu.regs.sp = if E {
                    0x100 | (self.cpu.regs.a & 0xff)
                } else {
                    self.cpu.regs.a
                }
            }
            Mnemonic::Tsc => {
                // TSC - Transfer Stack Pointer to Accumulator
                self.cpu.regs.a = self.cpu.regs.sp;
                self.cpu.update_nz16(self.cpu.regs.a)
            }
            Mnemonic::Tcd => {
                // TCD - Transfer Accumulator to Direct Page Register
                self.cpu.regs.dp = self.cpu.regs.a;
                self.cpu.update_nz16(self.cpu.regs.dp)
            }
            Mnemonic::Tdc => {
                // TDC - Transfer Direct Page Register to Accumulator
                self.cpu.regs.a = self.cpu.regs.dp;
                self.cpu.update_nz16(self.cpu.regs.a)
            }
            Mnemonic::Xba => {
                // XBA - Exchange the B and A Accumulators
                self.cpu.regs.a = self.cpu.regs.a.swap_bytes();
                self.cpu.update_nz8(self.cpu.regs.a8())
            }
            Mnemonic::Xce => {
                // XCE - Exchange Carry and Emulation Flags
                let emulation = self.cpu.regs.is_emulation;
                self.cpu.regs.status.set_if(Status::CARRY, emulation);
                self.cpu.set_emulation(carry)
            }
            Mnemonic::Rep | Mnemonic::Sep => {
                // REP/SEP - Reset/Set Status Bits
                let mask = Status(self.load::<u8>());
                if opcode.mnemonic == Mnemonic::Rep {
                    self.cpu.regs.status &= !mask
                } else {
                    self.cpu.regs.status |= mask
                }
                self.cpu.mode_switch()
            }
            Mnemonic::Clc => self.cpu.regs.status &= !Status::CARRY,
            Mnemonic::Cld => self.cpu.regs.status &= !Status::DECIMAL,
            Mnemonic::Cli => self.cpu.regs.status &= !Status::IRQ_DISABLE,
            Mnemonic::Clv => self.cpu.regs.status &= !Status::OVERFLOW,
            Mnemonic::Sec => self.cpu.regs.status |= Status::CARRY,
            Mnemonic::Sed => self.cpu.regs.status |= Status::DECIMAL,
            Mnemonic::Sei => self.cpu.regs.status |= Status::IRQ_DISABLE,
            Mnemonic::Wai => {
                // WAI - Wait for Interrupt
                self.run_state = RunState::Waiting
            }
            Mnemonic::Stp => {
                // STP - Stop the Processor
                log::debug!("processor stopped at {}", start);
                self.run_state = RunState::Halted
            }
            Mnemonic::Wdm => {
                // WDM - reserved, skips its signature byte
                let signature = self.load::<u8>();
                log::debug!("WDM ${:02x} at {}", signature, start);
            }
            Mnemonic::Nop => (),
        }
        cycles
    }
}
