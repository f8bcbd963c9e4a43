//! The fetch-decode-dispatch-retire state machine.

#![allow(
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::cast_possible_truncation
)]

use crate::decode::{decode, Instruction, Opcode};
use crate::ecall::EcallHandler;
use crate::mem::{access, MemoryPort};
use crate::registers::{Registers, REG_SP};
use crate::trap::{Trap, TrapCause};

/// Execution state machine of the core.
///
/// The steady-state cycle is `Fetching → Decoding → Dispatching → Retiring →
/// Fetching`; the intermediate states are visible only while a step is in
/// flight. `Trapped` is terminal: once entered, only [`Core::reset`] leaves
/// it, and further steps advance nothing but the cycle counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum CoreState {
    /// Reading the instruction word at pc.
    #[default]
    Fetching,
    /// Delegating the fetched word to the decoder.
    Decoding,
    /// Executing the decoded instruction.
    Dispatching,
    /// Committing the next pc.
    Retiring,
    /// Halted permanently on a fault.
    Trapped(Trap),
}

/// Result of one [`Core::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The instruction retired normally.
    Retired {
        /// pc of the retired instruction.
        pc: u32,
        /// Operation that retired, for tracing.
        op: Opcode,
    },
    /// An `ebreak` was reached; the core remains runnable and pc has advanced
    /// past the breakpoint.
    Breakpoint {
        /// pc of the `ebreak` instruction.
        pc: u32,
    },
    /// The core is (now) in the terminal trapped state.
    Trapped(Trap),
}

/// Why [`Core::run`] stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunExit {
    /// Execution paused at a breakpoint and may be resumed with another call.
    Breakpoint {
        /// pc of the `ebreak` instruction.
        pc: u32,
    },
    /// Execution halted permanently on a fault.
    Trapped(Trap),
}

/// How dispatch asked retirement to proceed.
enum Dispatch {
    /// Normal retirement: pc advances by 4.
    Retire,
    /// Control transfer: pc becomes the given target.
    Jump(u32),
    /// Breakpoint: report it, then retire normally.
    Breakpoint,
}

/// The execution core: register file, program counter, and the state machine
/// driving them.
///
/// The core owns its architectural state and borrows its collaborators for
/// the whole run; there is no global state. One instruction retires per
/// [`Self::step`], consuming one modeled clock unit between decode and
/// dispatch.
#[derive(Debug)]
pub struct Core<'a, M: MemoryPort, E: EcallHandler> {
    regs: Registers,
    pc: u32,
    cycles: u64,
    state: CoreState,
    mem: &'a mut M,
    ecall: &'a mut E,
}

impl<'a, M: MemoryPort, E: EcallHandler> Core<'a, M, E> {
    /// Creates a core at reset: pc 0, registers cleared, and `sp`
    /// conventionally set to the memory size.
    pub fn new(mem: &'a mut M, ecall: &'a mut E) -> Self {
        let mut regs = Registers::default();
        regs.write(REG_SP, mem.size());
        Self {
            regs,
            pc: 0,
            cycles: 0,
            state: CoreState::Fetching,
            mem,
            ecall,
        }
    }

    /// Returns the core to its reset state. The memory image is untouched.
    ///
    /// This is the only way out of [`CoreState::Trapped`].
    pub fn reset(&mut self) {
        self.regs = Registers::default();
        self.regs.write(REG_SP, self.mem.size());
        self.pc = 0;
        self.cycles = 0;
        self.state = CoreState::Fetching;
    }

    /// Current program counter.
    #[must_use]
    pub const fn pc(&self) -> u32 {
        self.pc
    }

    /// Clock units consumed so far (one per instruction, plus one per step
    /// spent trapped).
    #[must_use]
    pub const fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Current execution state.
    #[must_use]
    pub const fn state(&self) -> CoreState {
        self.state
    }

    /// The architectural register file.
    #[must_use]
    pub const fn regs(&self) -> &Registers {
        &self.regs
    }

    /// Executes exactly one instruction (or one trapped no-progress cycle).
    pub fn step(&mut self) -> StepOutcome {
        if let CoreState::Trapped(trap) = self.state {
            self.cycles += 1;
            return StepOutcome::Trapped(trap);
        }

        self.state = CoreState::Fetching;
        let word = match access::read_word(self.mem, self.pc) {
            Ok(word) => word,
            Err(cause) => return self.trap(cause),
        };

        self.state = CoreState::Decoding;
        let inst = match decode(word) {
            Ok(inst) => inst,
            Err(e) => return self.trap(TrapCause::from(e)),
        };

        // One clock unit per instruction, between decode and dispatch.
        self.cycles += 1;

        self.state = CoreState::Dispatching;
        let dispatch = match self.dispatch(&inst) {
            Ok(dispatch) => dispatch,
            Err(cause) => return self.trap(cause),
        };

        self.state = CoreState::Retiring;
        let retired_pc = self.pc;
        self.pc = match dispatch {
            Dispatch::Retire | Dispatch::Breakpoint => self.pc.wrapping_add(4),
            Dispatch::Jump(target) => target,
        };
        self.state = CoreState::Fetching;

        match dispatch {
            Dispatch::Breakpoint => StepOutcome::Breakpoint { pc: retired_pc },
            Dispatch::Retire | Dispatch::Jump(_) => StepOutcome::Retired {
                pc: retired_pc,
                op: inst.op,
            },
        }
    }

    /// Runs until the next breakpoint or trap.
    pub fn run(&mut self) -> RunExit {
        loop {
            match self.step() {
                StepOutcome::Retired { .. } => {}
                StepOutcome::Breakpoint { pc } => return RunExit::Breakpoint { pc },
                StepOutcome::Trapped(trap) => return RunExit::Trapped(trap),
            }
        }
    }

    fn trap(&mut self, cause: TrapCause) -> StepOutcome {
        let trap = Trap { cause, pc: self.pc };
        self.state = CoreState::Trapped(trap);
        StepOutcome::Trapped(trap)
    }

    #[allow(clippy::too_many_lines)]
    fn dispatch(&mut self, inst: &Instruction) -> Result<Dispatch, TrapCause> {
        let rs1 = self.regs.read(inst.rs1);
        let rs2 = self.regs.read(inst.rs2);
        let imm = inst.imm;
        let rd = inst.rd;
        let regs = &mut self.regs;

        match inst.op {
            // Register-register arithmetic/logical.
            Opcode::Add => regs.write(rd, rs1.wrapping_add(rs2)),
            Opcode::Sub => regs.write(rd, rs1.wrapping_sub(rs2)),
            Opcode::And => regs.write(rd, rs1 & rs2),
            Opcode::Or => regs.write(rd, rs1 | rs2),
            Opcode::Xor => regs.write(rd, rs1 ^ rs2),
            Opcode::Sll => regs.write(rd, rs1 << (rs2 & 31)),
            Opcode::Srl => regs.write(rd, rs1 >> (rs2 & 31)),
            Opcode::Sra => regs.write(rd, ((rs1 as i32) >> (rs2 & 31)) as u32),
            Opcode::Slt => regs.write(rd, u32::from((rs1 as i32) < (rs2 as i32))),
            Opcode::Sltu => regs.write(rd, u32::from(rs1 < rs2)),

            // Register-immediate arithmetic/logical.
            Opcode::Addi => regs.write(rd, rs1.wrapping_add(imm)),
            Opcode::Andi => regs.write(rd, rs1 & imm),
            Opcode::Ori => regs.write(rd, rs1 | imm),
            Opcode::Xori => regs.write(rd, rs1 ^ imm),
            Opcode::Slli => regs.write(rd, rs1 << (imm & 31)),
            Opcode::Srli => regs.write(rd, rs1 >> (imm & 31)),
            Opcode::Srai => regs.write(rd, ((rs1 as i32) >> (imm & 31)) as u32),
            Opcode::Slti => regs.write(rd, u32::from((rs1 as i32) < (imm as i32))),
            Opcode::Sltiu => regs.write(rd, u32::from(rs1 < imm)),

            // Upper immediate.
            Opcode::Lui => regs.write(rd, imm),
            Opcode::Auipc => regs.write(rd, self.pc.wrapping_add(imm)),

            // Conditional branches: taken means pc becomes old pc + imm.
            Opcode::Beq if rs1 == rs2 => return Ok(self.branch_target(imm)),
            Opcode::Bne if rs1 != rs2 => return Ok(self.branch_target(imm)),
            Opcode::Blt if (rs1 as i32) < (rs2 as i32) => return Ok(self.branch_target(imm)),
            Opcode::Bge if (rs1 as i32) >= (rs2 as i32) => return Ok(self.branch_target(imm)),
            Opcode::Bltu if rs1 < rs2 => return Ok(self.branch_target(imm)),
            Opcode::Bgeu if rs1 >= rs2 => return Ok(self.branch_target(imm)),
            Opcode::Beq | Opcode::Bne | Opcode::Blt | Opcode::Bge | Opcode::Bltu | Opcode::Bgeu => {
            }

            // Unconditional jumps: rd gets the return address; jalr clears
            // bit 0 of the computed target (rs1 is read before rd is
            // written, so `jalr rd, rd` behaves).
            Opcode::Jal => {
                regs.write(rd, self.pc.wrapping_add(4));
                return Ok(self.branch_target(imm));
            }
            Opcode::Jalr => {
                let target = rs1.wrapping_add(imm) & !1;
                regs.write(rd, self.pc.wrapping_add(4));
                return Ok(Dispatch::Jump(target));
            }

            // Loads: effective address rs1 + imm through the composed access
            // layer, then widened per the signed/unsigned variant.
            Opcode::Lw => {
                let value = access::read_word(self.mem, rs1.wrapping_add(imm))?;
                self.regs.write(rd, value);
            }
            Opcode::Lh => {
                let value = access::read_half(self.mem, rs1.wrapping_add(imm))?;
                self.regs.write(rd, value as i16 as i32 as u32);
            }
            Opcode::Lhu => {
                let value = access::read_half(self.mem, rs1.wrapping_add(imm))?;
                self.regs.write(rd, u32::from(value));
            }
            Opcode::Lb => {
                let value = access::read_byte(self.mem, rs1.wrapping_add(imm))?;
                self.regs.write(rd, value as i8 as i32 as u32);
            }
            Opcode::Lbu => {
                let value = access::read_byte(self.mem, rs1.wrapping_add(imm))?;
                self.regs.write(rd, u32::from(value));
            }

            // Stores: rs2 truncated to the access width.
            Opcode::Sw => access::write_word(self.mem, rs1.wrapping_add(imm), rs2)?,
            Opcode::Sh => access::write_half(self.mem, rs1.wrapping_add(imm), rs2 as u16)?,
            Opcode::Sb => access::write_byte(self.mem, rs1.wrapping_add(imm), rs2 as u8)?,

            // Nothing to order in a single-issue, uncached core.
            Opcode::Fence => {}

            Opcode::Ecall => self.ecall.handle(&mut self.regs),
            Opcode::Ebreak => return Ok(Dispatch::Breakpoint),
        }

        Ok(Dispatch::Retire)
    }

    const fn branch_target(&self, imm: u32) -> Dispatch {
        Dispatch::Jump(self.pc.wrapping_add(imm))
    }
}

#[cfg(test)]
mod tests {
    use super::{Core, CoreState, RunExit, StepOutcome};
    use crate::decode::Opcode;
    use crate::ecall::SilentEcall;
    use crate::mem::{access, Ram};
    use crate::trap::{Trap, TrapCause};

    fn load(words: &[u32]) -> Ram {
        let mut ram = Ram::new(1 << 16);
        for (i, word) in words.iter().enumerate() {
            access::write_word(&mut ram, (i * 4) as u32, *word).expect("aligned");
        }
        ram
    }

    #[test]
    fn reset_state_has_zero_pc_and_sp_at_memory_size() {
        let mut ram = Ram::new(1 << 16);
        let mut ecall = SilentEcall;
        let core = Core::new(&mut ram, &mut ecall);
        assert_eq!(core.pc(), 0);
        assert_eq!(core.cycles(), 0);
        assert_eq!(core.state(), CoreState::Fetching);
        assert_eq!(core.regs().read(2), 1 << 16);
    }

    #[test]
    fn step_retires_one_instruction_and_consumes_one_cycle() {
        // addi x1, x0, 5
        let mut ram = load(&[0x0050_0093]);
        let mut ecall = SilentEcall;
        let mut core = Core::new(&mut ram, &mut ecall);

        let outcome = core.step();
        assert_eq!(
            outcome,
            StepOutcome::Retired {
                pc: 0,
                op: Opcode::Addi
            }
        );
        assert_eq!(core.regs().read(1), 5);
        assert_eq!(core.pc(), 4);
        assert_eq!(core.cycles(), 1);
    }

    #[test]
    fn decode_failure_traps_with_faulting_pc_and_word() {
        let mut ram = load(&[0xFFFF_FFFF]);
        let mut ecall = SilentEcall;
        let mut core = Core::new(&mut ram, &mut ecall);

        let expected = Trap {
            cause: TrapCause::DecodeFailure { word: 0xFFFF_FFFF },
            pc: 0,
        };
        assert_eq!(core.step(), StepOutcome::Trapped(expected));
        assert_eq!(core.state(), CoreState::Trapped(expected));
    }

    #[test]
    fn trapped_state_is_terminal_but_the_clock_still_advances() {
        let mut ram = load(&[0xFFFF_FFFF]);
        let mut ecall = SilentEcall;
        let mut core = Core::new(&mut ram, &mut ecall);

        let _ = core.step();
        let cycles_at_trap = core.cycles();
        let pc_at_trap = core.pc();

        for _ in 0..3 {
            assert!(matches!(core.step(), StepOutcome::Trapped(_)));
        }
        assert_eq!(core.cycles(), cycles_at_trap + 3);
        assert_eq!(core.pc(), pc_at_trap);
    }

    #[test]
    fn breakpoint_is_reported_and_execution_can_resume_past_it() {
        // ebreak; addi x1, x0, 5
        let mut ram = load(&[0x0010_0073, 0x0050_0093]);
        let mut ecall = SilentEcall;
        let mut core = Core::new(&mut ram, &mut ecall);

        assert_eq!(core.step(), StepOutcome::Breakpoint { pc: 0 });
        assert_eq!(core.state(), CoreState::Fetching);
        assert_eq!(core.pc(), 4);

        assert!(matches!(core.step(), StepOutcome::Retired { .. }));
        assert_eq!(core.regs().read(1), 5);
    }

    #[test]
    fn run_stops_at_breakpoint_and_resumes_on_the_next_call() {
        // addi x1, x0, 1; ebreak; addi x1, x1, 1; ebreak
        let mut ram = load(&[0x0010_0093, 0x0010_0073, 0x0010_8093, 0x0010_0073]);
        let mut ecall = SilentEcall;
        let mut core = Core::new(&mut ram, &mut ecall);

        assert_eq!(core.run(), RunExit::Breakpoint { pc: 4 });
        assert_eq!(core.regs().read(1), 1);
        assert_eq!(core.run(), RunExit::Breakpoint { pc: 12 });
        assert_eq!(core.regs().read(1), 2);
    }

    #[test]
    fn misaligned_jalr_target_traps_at_fetch() {
        // jalr x0, 2(x0) -> target 2 after bit-0 clearing, still 2 mod 4.
        let mut ram = load(&[0x0020_0067]);
        let mut ecall = SilentEcall;
        let mut core = Core::new(&mut ram, &mut ecall);

        assert!(matches!(core.step(), StepOutcome::Retired { .. }));
        assert_eq!(
            core.step(),
            StepOutcome::Trapped(Trap {
                cause: TrapCause::MisalignedAccess { addr: 2 },
                pc: 2,
            })
        );
    }

    #[test]
    fn misaligned_load_traps_with_the_effective_address() {
        // lw x1, 1(x0)
        let mut ram = load(&[0x0010_2083]);
        let mut ecall = SilentEcall;
        let mut core = Core::new(&mut ram, &mut ecall);

        assert_eq!(
            core.step(),
            StepOutcome::Trapped(Trap {
                cause: TrapCause::MisalignedAccess { addr: 1 },
                pc: 0,
            })
        );
    }

    #[test]
    fn reset_clears_a_trap_and_restores_the_reset_state() {
        let mut ram = load(&[0xFFFF_FFFF]);
        let mut ecall = SilentEcall;
        let mut core = Core::new(&mut ram, &mut ecall);

        let _ = core.step();
        assert!(matches!(core.state(), CoreState::Trapped(_)));

        core.reset();
        assert_eq!(core.state(), CoreState::Fetching);
        assert_eq!(core.pc(), 0);
        assert_eq!(core.cycles(), 0);
        assert_eq!(core.regs().read(2), 1 << 16);
    }
}
