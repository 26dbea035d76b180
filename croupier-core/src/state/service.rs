//! Dealer service
//!
//! Wraps a [`CardDealer`] and the board I/O into a scheduler service. The
//! switch is read once per scheduler pass, and the dealer's commands are
//! applied to the hardware traits and the dealer's timers.

use croupier_protocol::Record;

use super::command::{Command, Commands};
use super::machine::CardDealer;
use crate::config::DealerConfig;
use crate::scheduler::{Context, Event, Service};
use crate::traits::DealerIo;

/// Scheduler service running the card dealer
pub struct DealerService<H> {
    dealer: CardDealer,
    io: H,
}

impl<H: DealerIo> DealerService<H> {
    pub fn new(config: DealerConfig, mut io: H) -> Self {
        let switch_on = io.switch_on();
        Self {
            dealer: CardDealer::new(config, switch_on),
            io,
        }
    }

    pub fn dealer(&self) -> &CardDealer {
        &self.dealer
    }

    pub fn io(&self) -> &H {
        &self.io
    }

    pub fn io_mut(&mut self) -> &mut H {
        &mut self.io
    }

    fn apply(&mut self, commands: &Commands, ctx: &mut Context<'_>) {
        for command in commands {
            match *command {
                // Dealer timer ids are fixed and always in range
                Command::ArmTimer(id, ms) => {
                    let _ = ctx.arm_timer(id, ms);
                }
                Command::CancelTimer(id) => ctx.cancel_timer(id),
                Command::SetSweep(pulse_us) => self.io.set_pulse_us(pulse_us),
                Command::Drive(direction, duty) => self.io.drive(direction, duty),
                Command::Coast => self.io.coast(),
                Command::StopMotor => self.io.stop_motor(),
                Command::Ranging(enabled) => self.io.set_ranging(enabled),
                Command::ResetRanging => self.io.reset_filter(),
                Command::ShowMode(mode) => self.io.show_mode(mode),
                Command::SampleDistance => {
                    let sample = Record::Sample {
                        raw_cm: self.io.raw_cm(),
                        filtered_cm: self.io.filtered_cm(),
                    };
                    self.io.emit(&sample);
                }
                Command::Emit(record) => self.io.emit(&record),
            }
        }
    }
}

impl<H: DealerIo> Service for DealerService<H> {
    fn init(&mut self, ctx: &mut Context<'_>) {
        let commands = self.dealer.init();
        self.apply(&commands, ctx);
    }

    fn handle(&mut self, event: Event, ctx: &mut Context<'_>) {
        let commands = self.dealer.handle(event);
        self.apply(&commands, ctx);
    }

    fn poll(&mut self, ctx: &mut Context<'_>) {
        let switch_on = self.io.switch_on();
        let commands = self.dealer.sample_switch(switch_on);
        self.apply(&commands, ctx);
    }
}
