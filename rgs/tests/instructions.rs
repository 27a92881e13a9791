mod common;

use common::*;
use rgs::{
    cpu::{Mode, Status},
    device::Addr24,
};

fn status(device: &rgs::device::Device<rgs::backend::Dummy>, flag: Status) -> bool {
    device.regs().status.has(flag)
}

#[test]
fn load_immediate_sets_flags() {
    // LDA #$80; LDA #$00
    let mut device = device_with_program(&[0xa9, 0x80, 0xa9, 0x00]);
    assert_eq!(steps(&mut device, 1), 2);
    assert_eq!(device.regs().a8(), 0x80);
    assert!(status(&device, Status::NEGATIVE));
    assert!(!status(&device, Status::ZERO));
    steps(&mut device, 1);
    assert!(status(&device, Status::ZERO));
    assert!(!status(&device, Status::NEGATIVE));
}

#[test]
fn eight_bit_accumulator_keeps_high_byte() {
    // LDA #$12
    let mut device = device_with_program(&[0xa9, 0x12]);
    device.cpu_mut().regs.a = 0xab00;
    steps(&mut device, 1);
    assert_eq!(device.regs().a, 0xab12);
}

#[test]
fn sixteen_bit_load_and_store() {
    let mut code = native(false, true);
    // LDA #$1234; STA $3000
    code.extend([0xa9, 0x34, 0x12, 0x8d, 0x00, 0x30]);
    let mut device = device_with_program(&code);
    steps(&mut device, 3);
    assert_eq!(device.cpu().mode(), Mode::M16X8);
    assert_eq!(steps(&mut device, 1), 3);
    assert_eq!(device.regs().a, 0x1234);
    assert_eq!(steps(&mut device, 1), 5);
    assert_eq!(peek(&mut device, 0, 0x3000), 0x34);
    assert_eq!(peek(&mut device, 0, 0x3001), 0x12);
}

#[test]
fn indexed_read_page_cross_penalty() {
    // LDX #$01; LDA $3000,X; LDX #$FF; LDA $30F0,X
    let mut device = device_with_program(&[
        0xa2, 0x01, 0xbd, 0x00, 0x30, 0xa2, 0xff, 0xbd, 0xf0, 0x30,
    ]);
    device.write_byte(Addr24::new(0, 0x3001), 0x11);
    device.write_byte(Addr24::new(0, 0x31ef), 0x22);
    steps(&mut device, 1);
    assert_eq!(steps(&mut device, 1), 4);
    assert_eq!(device.regs().a8(), 0x11);
    steps(&mut device, 1);
    assert_eq!(steps(&mut device, 1), 5);
    assert_eq!(device.regs().a8(), 0x22);
}

#[test]
fn direct_page_low_byte_penalty() {
    // LDA $10; LDA $10
    let mut device = device_with_program(&[0xa5, 0x10, 0xa5, 0x10]);
    device.write_byte(Addr24::new(0, 0x0010), 0x01);
    device.write_byte(Addr24::new(0, 0x0011), 0x02);
    assert_eq!(steps(&mut device, 1), 3);
    assert_eq!(device.regs().a8(), 0x01);
    device.cpu_mut().regs.dp = 0x0001;
    assert_eq!(steps(&mut device, 1), 4);
    assert_eq!(device.regs().a8(), 0x02);
}

#[test]
fn emulation_direct_page_wraps_in_page() {
    // LDX #$02; LDA $FF,X
    let mut device = device_with_program(&[0xa2, 0x02, 0xb5, 0xff]);
    device.write_byte(Addr24::new(0, 0x0001), 0x5e);
    device.write_byte(Addr24::new(0, 0x0101), 0x77);
    steps(&mut device, 2);
    assert_eq!(device.regs().a8(), 0x5e);
}

#[test]
fn indirect_indexed() {
    // LDY #$05; LDA ($10),Y
    let mut device = device_with_program(&[0xa0, 0x05, 0xb1, 0x10]);
    device.write_byte(Addr24::new(0, 0x0010), 0x00);
    device.write_byte(Addr24::new(0, 0x0011), 0x30);
    device.write_byte(Addr24::new(0, 0x3005), 0x9a);
    steps(&mut device, 1);
    assert_eq!(steps(&mut device, 1), 5);
    assert_eq!(device.regs().a8(), 0x9a);
}

#[test]
fn long_addressing_uses_any_bank() {
    // LDA #$66; STA $020304; LDA #$00; LDA $020304
    let mut device = device_with_program(&[
        0xa9, 0x66, 0x8f, 0x04, 0x03, 0x02, 0xa9, 0x00, 0xaf, 0x04, 0x03, 0x02,
    ]);
    steps(&mut device, 4);
    assert_eq!(device.regs().a8(), 0x66);
    assert_eq!(peek(&mut device, 0x02, 0x0304), 0x66);
}

#[test]
fn branches() {
    // LDA #$00; BNE +2; BEQ +2; NOP; NOP; NOP
    let mut device = device_with_program(&[0xa9, 0x00, 0xd0, 0x02, 0xf0, 0x02, 0xea, 0xea, 0xea]);
    steps(&mut device, 1);
    assert_eq!(steps(&mut device, 1), 2);
    assert_eq!(device.regs().pc.addr, ENTRY + 4);
    assert_eq!(steps(&mut device, 1), 3);
    assert_eq!(device.regs().pc.addr, ENTRY + 8);
}

#[test]
fn branch_page_cross_costs_extra_in_emulation() {
    let mut device = device();
    // BRA +4 right before a page boundary
    load_program(&mut device, 0x10fc, &[0x80, 0x04]);
    device.cpu_mut().regs.pc = Addr24::new(0, 0x10fc);
    assert_eq!(steps(&mut device, 1), 4);
    assert_eq!(device.regs().pc.addr, 0x1102);

    // CLC; XCE; BRA +4
    load_program(&mut device, 0x11fa, &[0x18, 0xfb, 0x80, 0x04]);
    device.cpu_mut().regs.pc = Addr24::new(0, 0x11fa);
    steps(&mut device, 2);
    assert_eq!(steps(&mut device, 1), 3);
    assert_eq!(device.regs().pc.addr, 0x1202);
}

#[test]
fn branch_long_and_backwards() {
    // BRL +$1000; ... BRA -2
    let mut device = device_with_program(&[0x82, 0x00, 0x10]);
    load_program(&mut device, 0x2003, &[0x80, 0xfe]);
    assert_eq!(steps(&mut device, 1), 4);
    assert_eq!(device.regs().pc.addr, 0x2003);
    steps(&mut device, 3);
    assert_eq!(device.regs().pc.addr, 0x2003);
}

#[test]
fn subroutines() {
    // JSR $2000; JSL $003000
    let mut device = device_with_program(&[0x20, 0x00, 0x20, 0x22, 0x00, 0x30, 0x00]);
    // RTS
    load_program(&mut device, 0x2000, &[0x60]);
    // RTL
    load_program(&mut device, 0x3000, &[0x6b]);
    assert_eq!(steps(&mut device, 1), 6);
    assert_eq!(device.regs().pc.addr, 0x2000);
    assert_eq!(device.regs().sp, 0x1fd);
    assert_eq!(peek(&mut device, 0, 0x01ff), 0x10);
    assert_eq!(peek(&mut device, 0, 0x01fe), 0x02);
    assert_eq!(steps(&mut device, 1), 6);
    assert_eq!(device.regs().pc.addr, ENTRY + 3);

    assert_eq!(steps(&mut device, 1), 8);
    assert_eq!(device.regs().pc, Addr24::new(0, 0x3000));
    assert_eq!(peek(&mut device, 0, 0x01ff), 0x00);
    assert_eq!(device.regs().sp, 0x1fc);
    steps(&mut device, 1);
    assert_eq!(device.regs().pc, Addr24::new(0, ENTRY + 7));
    assert_eq!(device.regs().sp, 0x1ff);
}

#[test]
fn indirect_jumps() {
    // JMP ($3000)
    let mut device = device_with_program(&[0x6c, 0x00, 0x30]);
    device.write::<u16>(Addr24::new(0, 0x3000), 0x2345, rgs::device::Wrap::Bank);
    assert_eq!(steps(&mut device, 1), 5);
    assert_eq!(device.regs().pc.addr, 0x2345);
}

#[test]
fn sixteen_bit_stack() {
    let mut code = native(false, true);
    // LDA #$BEEF; PHA; LDA #$0000; PLA
    code.extend([0xa9, 0xef, 0xbe, 0x48, 0xa9, 0x00, 0x00, 0x68]);
    let mut device = device_with_program(&code);
    steps(&mut device, 4);
    assert_eq!(steps(&mut device, 1), 4);
    assert_eq!(peek(&mut device, 0, 0x01ff), 0xbe);
    assert_eq!(peek(&mut device, 0, 0x01fe), 0xef);
    assert_eq!(device.regs().sp, 0x1fd);
    steps(&mut device, 1);
    assert_eq!(steps(&mut device, 1), 5);
    assert_eq!(device.regs().a, 0xbeef);
    assert!(status(&device, Status::NEGATIVE));
    assert_eq!(device.regs().sp, 0x1ff);
}

#[test]
fn emulation_stack_stays_in_page_one() {
    // LDA #$77; PHA
    let mut device = device_with_program(&[0xa9, 0x77, 0x48]);
    device.cpu_mut().regs.sp = 0x100;
    steps(&mut device, 2);
    assert_eq!(peek(&mut device, 0, 0x0100), 0x77);
    assert_eq!(device.regs().sp, 0x1ff);
}

#[test]
fn block_move_next() {
    let mut code = native(false, false);
    // LDA #$0002; LDX #$3000; LDY #$4000; MVN $01,$00
    code.extend([
        0xa9, 0x02, 0x00, 0xa2, 0x00, 0x30, 0xa0, 0x00, 0x40, 0x54, 0x01, 0x00,
    ]);
    let mut device = device_with_program(&code);
    for (i, byte) in [1, 2, 3].into_iter().enumerate() {
        device.write_byte(Addr24::new(0, 0x3000 + i as u16), byte);
    }
    steps(&mut device, 6);
    let mvn = device.regs().pc.addr;
    assert_eq!(steps(&mut device, 1), 7);
    assert_eq!(device.regs().pc.addr, mvn);
    assert_eq!(device.regs().a, 1);
    assert_eq!(device.regs().db, 1);
    assert_eq!(steps(&mut device, 2), 14);
    assert_eq!(device.regs().pc.addr, mvn + 3);
    assert_eq!(device.regs().a, 0xffff);
    assert_eq!(device.regs().x, 0x3003);
    assert_eq!(device.regs().y, 0x4003);
    for (i, byte) in [1, 2, 3].into_iter().enumerate() {
        assert_eq!(peek(&mut device, 1, 0x4000 + i as u16), byte);
    }
}

#[test]
fn block_move_previous() {
    let mut code = native(false, false);
    // LDA #$0001; LDX #$3001; LDY #$4001; MVP $00,$00
    code.extend([
        0xa9, 0x01, 0x00, 0xa2, 0x01, 0x30, 0xa0, 0x01, 0x40, 0x44, 0x00, 0x00,
    ]);
    let mut device = device_with_program(&code);
    device.write_byte(Addr24::new(0, 0x3000), 0xaa);
    device.write_byte(Addr24::new(0, 0x3001), 0xbb);
    steps(&mut device, 8);
    assert_eq!(peek(&mut device, 0, 0x4000), 0xaa);
    assert_eq!(peek(&mut device, 0, 0x4001), 0xbb);
    assert_eq!(device.regs().x, 0x2fff);
    assert_eq!(device.regs().a, 0xffff);
}

#[test]
fn decimal_arithmetic() {
    // SED; CLC; LDA #$19; ADC #$28
    // SEC; LDA #$10; SBC #$01
    // CLC; LDA #$99; ADC #$01
    let mut device = device_with_program(&[
        0xf8, 0x18, 0xa9, 0x19, 0x69, 0x28, 0x38, 0xa9, 0x10, 0xe9, 0x01, 0x18, 0xa9, 0x99,
        0x69, 0x01,
    ]);
    steps(&mut device, 4);
    assert_eq!(device.regs().a8(), 0x47);
    assert!(!status(&device, Status::CARRY));
    steps(&mut device, 3);
    assert_eq!(device.regs().a8(), 0x09);
    assert!(status(&device, Status::CARRY));
    steps(&mut device, 3);
    assert_eq!(device.regs().a8(), 0x00);
    assert!(status(&device, Status::CARRY));
    assert!(status(&device, Status::ZERO));
}

#[test]
fn sixteen_bit_decimal() {
    let mut code = native(false, true);
    // SED; CLC; LDA #$1999; ADC #$0001
    code.extend([0xf8, 0x18, 0xa9, 0x99, 0x19, 0x69, 0x01, 0x00]);
    let mut device = device_with_program(&code);
    steps(&mut device, 7);
    assert_eq!(device.regs().a, 0x2000);
    assert!(!status(&device, Status::CARRY));
}

#[test]
fn binary_overflow() {
    // CLC; LDA #$7F; ADC #$01
    let mut device = device_with_program(&[0x18, 0xa9, 0x7f, 0x69, 0x01]);
    steps(&mut device, 3);
    assert_eq!(device.regs().a8(), 0x80);
    assert!(status(&device, Status::OVERFLOW));
    assert!(status(&device, Status::NEGATIVE));
    assert!(!status(&device, Status::CARRY));
}

#[test]
fn compare() {
    // LDA #$40; CMP #$40; CMP #$41
    let mut device = device_with_program(&[0xa9, 0x40, 0xc9, 0x40, 0xc9, 0x41]);
    steps(&mut device, 2);
    assert!(status(&device, Status::ZERO));
    assert!(status(&device, Status::CARRY));
    steps(&mut device, 1);
    assert!(!status(&device, Status::ZERO));
    assert!(!status(&device, Status::CARRY));
    assert!(status(&device, Status::NEGATIVE));
}

#[test]
fn read_modify_write() {
    // INC $3000; SEC; LDA #$02; ROR A
    let mut device = device_with_program(&[0xee, 0x00, 0x30, 0x38, 0xa9, 0x02, 0x6a]);
    device.write_byte(Addr24::new(0, 0x3000), 0xff);
    assert_eq!(steps(&mut device, 1), 6);
    assert_eq!(peek(&mut device, 0, 0x3000), 0x00);
    assert!(status(&device, Status::ZERO));
    steps(&mut device, 3);
    assert_eq!(device.regs().a8(), 0x81);
    assert!(!status(&device, Status::CARRY));
    assert!(status(&device, Status::NEGATIVE));
}

#[test]
fn sixteen_bit_read_modify_write() {
    let mut code = native(false, true);
    // INC $3000; ASL A
    code.extend([0xee, 0x00, 0x30, 0x0a]);
    let mut device = device_with_program(&code);
    device.write_byte(Addr24::new(0, 0x3000), 0xff);
    device.cpu_mut().regs.a = 0x8001;
    steps(&mut device, 3);
    assert_eq!(steps(&mut device, 1), 8);
    assert_eq!(peek(&mut device, 0, 0x3000), 0x00);
    assert_eq!(peek(&mut device, 0, 0x3001), 0x01);
    assert_eq!(steps(&mut device, 1), 2);
    assert_eq!(device.regs().a, 0x0002);
    assert!(status(&device, Status::CARRY));
}

#[test]
fn test_and_set_bits() {
    // LDA #$0F; TSB $3000; TRB $3001
    let mut device = device_with_program(&[0xa9, 0x0f, 0x0c, 0x00, 0x30, 0x1c, 0x01, 0x30]);
    device.write_byte(Addr24::new(0, 0x3000), 0xf0);
    device.write_byte(Addr24::new(0, 0x3001), 0xff);
    steps(&mut device, 2);
    assert_eq!(peek(&mut device, 0, 0x3000), 0xff);
    assert!(status(&device, Status::ZERO));
    steps(&mut device, 1);
    assert_eq!(peek(&mut device, 0, 0x3001), 0xf0);
    assert!(!status(&device, Status::ZERO));
}

#[test]
fn exchange_and_transfers() {
    // XBA; TCD; TDC
    let mut device = device_with_program(&[0xeb, 0x5b, 0x7b]);
    device.cpu_mut().regs.a = 0x1234;
    assert_eq!(steps(&mut device, 1), 3);
    assert_eq!(device.regs().a, 0x3412);
    steps(&mut device, 1);
    assert_eq!(device.regs().dp, 0x3412);
    device.cpu_mut().regs.a = 0;
    steps(&mut device, 1);
    assert_eq!(device.regs().a, 0x3412);
}

#[test]
fn reserved_opcode_is_a_two_byte_nop() {
    // WDM $55; NOP
    let mut device = device_with_program(&[0x42, 0x55, 0xea]);
    assert_eq!(steps(&mut device, 1), 2);
    assert_eq!(device.regs().pc.addr, ENTRY + 2);
}

#[test]
fn mode_follows_flag_changes() {
    let mut code = native(false, false);
    // LDX #$1234; SEP #$10
    code.extend([0xa2, 0x34, 0x12, 0xe2, 0x10]);
    // SEC; XCE
    code.extend([0x38, 0xfb]);
    let mut device = device_with_program(&code);
    steps(&mut device, 3);
    assert_eq!(device.cpu().mode(), Mode::M16X16);
    steps(&mut device, 2);
    assert_eq!(device.regs().x, 0x34);
    assert_eq!(device.cpu().mode(), Mode::M16X8);
    device.cpu_mut().regs.sp = 0x0480;
    steps(&mut device, 2);
    assert_eq!(device.cpu().mode(), Mode::Emulation);
    assert!(!status(&device, Status::CARRY));
    assert!(status(&device, Status::ACCUMULATION));
    assert_eq!(device.regs().sp, 0x0180);
}

#[test]
fn pull_status() {
    let mut code = native(true, true);
    // LDA #$00; PHA; PLP
    code.extend([0xa9, 0x00, 0x48, 0x28]);
    let mut device = device_with_program(&code);
    steps(&mut device, 4);
    assert_eq!(device.cpu().mode(), Mode::M8X8);
    steps(&mut device, 3);
    assert_eq!(device.cpu().mode(), Mode::M16X16);

    // in emulation mode PLP cannot clear M and X
    // LDA #$00; PHA; PLP
    let mut device = device_with_program(&[0xa9, 0x00, 0x48, 0x28]);
    steps(&mut device, 3);
    assert_eq!(device.cpu().mode(), Mode::Emulation);
    assert!(status(&device, Status::ACCUMULATION));
    assert!(status(&device, Status::INDEX_REGISTER_SIZE));
}

#[test]
fn return_from_interrupt_native() {
    let mut code = native(true, true);
    // RTI
    code.push(0x40);
    let mut device = device_with_program(&code);
    steps(&mut device, 3);
    device.cpu_mut().regs.sp = 0x1fb;
    for (addr, byte) in [(0x1fc, 0x20), (0x1fd, 0x00), (0x1fe, 0x30), (0x1ff, 0x02)] {
        device.write_byte(Addr24::new(0, addr), byte);
    }
    assert_eq!(steps(&mut device, 1), 7);
    assert_eq!(device.regs().pc, Addr24::new(0x02, 0x3000));
    assert_eq!(device.cpu().mode(), Mode::M8X16);
    assert_eq!(device.regs().sp, 0x1ff);
}
