//! Interactive text front-end
//!
//! Reads one command per line, validates the tokens, calls the engine and
//! renders the result. Users see 1-based slot numbers throughout.
//!
//! ```text
//! entry KA-01 car
//! exit KA-01 90
//! availability | stats | layout
//! rate bike 25
//! init 10 5 2
//! help | quit
//! ```

use crate::allocation::{
    AllocationEngine, ClassMap, EntryOutcome, ExitOutcome, SlotState, VehicleClass, VehicleId,
};
use crate::error::Error;
use anyhow::Context;
use std::io::{BufRead, Write};
use tracing::{debug, error};

const HELP: &str = "\
Commands:
  entry <vehicle-id> <car|bike|truck>   Park a vehicle (or join the waitlist)
  exit <vehicle-id> <minutes>           Vehicle leaves after <minutes>
  availability                          Free slots, occupied slots, waitlist
  stats                                 Occupancy and earnings
  layout                                Every slot with its status
  rate <car|bike|truck> <amount>        Set the hourly rate
  init <cars> <bikes> <trucks>          Rebuild the facility
  help                                  Show this help
  quit                                  Leave
";

/// Whether the session should keep reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// A line-oriented session over any reader/writer pair
pub struct Shell<R, W> {
    engine: AllocationEngine,
    input: R,
    output: W,
    prompt: bool,
}

impl<R: BufRead, W: Write> Shell<R, W> {
    pub fn new(engine: AllocationEngine, input: R, output: W) -> Self {
        Self {
            engine,
            input,
            output,
            prompt: false,
        }
    }

    /// Print a `> ` prompt before each command
    pub fn with_prompt(mut self, prompt: bool) -> Self {
        self.prompt = prompt;
        self
    }

    pub fn into_parts(self) -> (AllocationEngine, W) {
        (self.engine, self.output)
    }

    /// Run until `quit` or end of input
    pub fn run(&mut self) -> anyhow::Result<()> {
        let stats = self.engine.stats();
        writeln!(
            self.output,
            "✅ Parking ready: {} slots. Type 'help' for commands.",
            stats.total_slots
        )?;

        let mut line = String::new();
        loop {
            if self.prompt {
                write!(self.output, "> ")?;
                self.output.flush()?;
            }

            line.clear();
            let read = self
                .input
                .read_line(&mut line)
                .context("Failed to read command")?;
            if read == 0 {
                break;
            }

            if self.execute(line.trim())? == Flow::Quit {
                break;
            }
        }

        writeln!(self.output, "👋 Goodbye!")?;
        Ok(())
    }

    /// Execute one command line
    ///
    /// Bad input is reported and the session continues; only engine
    /// failures and I/O errors are returned.
    pub fn execute(&mut self, line: &str) -> anyhow::Result<Flow> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let Some((&command, args)) = tokens.split_first() else {
            return Ok(Flow::Continue);
        };
        debug!(command, ?args, "Shell command");

        let result = match command.to_ascii_lowercase().as_str() {
            "entry" | "in" => self.entry(args),
            "exit" | "out" => self.exit(args),
            "availability" | "avail" => self.availability(),
            "stats" => self.stats(),
            "layout" => self.layout(),
            "rate" => self.rate(args),
            "init" => self.init(args),
            "help" | "?" => writeln!(self.output, "{}", HELP).map_err(Into::into),
            "quit" | "q" => return Ok(Flow::Quit),
            other => Err(Error::InvalidArgument(format!("Unknown command '{}'", other)).into()),
        };

        match result {
            Ok(()) => Ok(Flow::Continue),
            Err(e) => match e.downcast_ref::<Error>() {
                Some(engine_err) if engine_err.is_fatal() => {
                    error!(error = %engine_err, "Engine failure, stopping session");
                    Err(e)
                }
                Some(user_err) => {
                    writeln!(self.output, " ❗ {}", user_err)?;
                    Ok(Flow::Continue)
                }
                None => Err(e),
            },
        }
    }

    fn entry(&mut self, args: &[&str]) -> anyhow::Result<()> {
        let [id, class] = args else {
            return Err(usage("entry <vehicle-id> <car|bike|truck>"));
        };
        let vehicle = VehicleId::new(*id)?;
        let class: VehicleClass = class.parse()?;

        match self.engine.entry(vehicle.clone(), class)? {
            EntryOutcome::Assigned(a) => writeln!(
                self.output,
                "🎫 Ticket: {}  | Vehicle: {} | Type: {} | Slot#: {}",
                a.ticket,
                a.vehicle,
                a.class,
                a.slot.number()
            )?,
            EntryOutcome::Queued { class, position } => writeln!(
                self.output,
                "⏳ No free {} slots. Added to waitlist position {}",
                class, position
            )?,
            EntryOutcome::AlreadyParked { slot } => writeln!(
                self.output,
                "❗ Vehicle \"{}\" already parked in slot {}",
                vehicle,
                slot.number()
            )?,
            EntryOutcome::AlreadyQueued { class, position } => writeln!(
                self.output,
                "❗ Vehicle \"{}\" already waiting for a {} slot (position {})",
                vehicle, class, position
            )?,
        }
        Ok(())
    }

    fn exit(&mut self, args: &[&str]) -> anyhow::Result<()> {
        let [id, minutes] = args else {
            return Err(usage("exit <vehicle-id> <minutes>"));
        };
        let minutes = parse_count::<i64>(minutes, "duration in minutes")?;

        match self.engine.exit(id, minutes)? {
            ExitOutcome::NotParked => {
                writeln!(self.output, "❗ Vehicle \"{}\" not found.", id)?;
            }
            ExitOutcome::Released(r) => {
                writeln!(self.output, "🧾 Receipt")?;
                writeln!(self.output, "  Vehicle : {}", r.vehicle)?;
                writeln!(self.output, "  Ticket  : {}", r.ticket)?;
                writeln!(self.output, "  Slot    : {} ({})", r.slot.number(), r.class)?;
                writeln!(
                    self.output,
                    "  Duration: {} minutes ({} hour(s) billed)",
                    r.elapsed_minutes, r.billed_hours
                )?;
                writeln!(self.output, "  Rate/hr : {:.2}", r.rate)?;
                writeln!(self.output, "  Amount  : {:.2}", r.fee)?;
                if let Some(next) = r.handoff {
                    writeln!(
                        self.output,
                        "➡️ Freed slot {} assigned to waitlisted vehicle \"{}\" | New Ticket: {}",
                        next.slot.number(),
                        next.vehicle,
                        next.ticket
                    )?;
                }
            }
        }
        Ok(())
    }

    fn availability(&mut self) -> anyhow::Result<()> {
        let snapshot = self.engine.availability();
        writeln!(
            self.output,
            "📊 Availability: Free total = {}  (Cars: {}, Bikes: {}, Trucks: {})",
            snapshot.total_free, snapshot.free.car, snapshot.free.bike, snapshot.free.truck
        )?;

        writeln!(self.output, "🚗 Occupied slots:")?;
        if snapshot.occupied.is_empty() {
            writeln!(self.output, "  (none)")?;
        }
        for slot in &snapshot.occupied {
            writeln!(
                self.output,
                "  Slot {} | {} | Vehicle: {} | Ticket: {}",
                slot.slot.number(),
                slot.class,
                slot.vehicle,
                slot.ticket
            )?;
        }

        writeln!(self.output, "📋 Waitlist size: {}", snapshot.waitlist.len())?;
        for waiting in &snapshot.waitlist {
            writeln!(
                self.output,
                "  {}. {} ({})",
                waiting.position, waiting.vehicle, waiting.class
            )?;
        }
        Ok(())
    }

    fn stats(&mut self) -> anyhow::Result<()> {
        let stats = self.engine.stats();
        writeln!(self.output, "=== Parking Statistics ===")?;
        writeln!(self.output, "Total slots           : {}", stats.total_slots)?;
        writeln!(self.output, "Currently occupied    : {}", stats.occupied)?;
        writeln!(self.output, "Occupancy percent     : {:.2}%", stats.occupancy_percent)?;
        writeln!(self.output, "Total served (history): {}", stats.total_served)?;
        writeln!(self.output, "Total earnings        : {:.2}", stats.total_earnings)?;
        writeln!(
            self.output,
            "Rates per hour        : CAR={:.2}, BIKE={:.2}, TRUCK={:.2}",
            stats.rates.car, stats.rates.bike, stats.rates.truck
        )?;
        Ok(())
    }

    fn layout(&mut self) -> anyhow::Result<()> {
        writeln!(self.output, "Slots layout (Slot# : Type : Status)")?;
        for view in self.engine.layout() {
            let status = match &view.state {
                SlotState::Free => "FREE".to_string(),
                SlotState::Occupied { vehicle, .. } => format!("OCC - {}", vehicle),
            };
            writeln!(
                self.output,
                "  {} : {} : {}",
                view.slot.number(),
                view.class,
                status
            )?;
        }
        Ok(())
    }

    fn rate(&mut self, args: &[&str]) -> anyhow::Result<()> {
        let [class, amount] = args else {
            return Err(usage("rate <car|bike|truck> <amount>"));
        };
        let class: VehicleClass = class.parse()?;
        let amount: f64 = amount
            .parse()
            .map_err(|_| Error::InvalidArgument(format!("Invalid rate '{}'", amount)))?;

        self.engine.set_rate(class, amount)?;
        writeln!(self.output, "✅ Rate set: {} = {:.2}/hr", class, amount)?;
        Ok(())
    }

    fn init(&mut self, args: &[&str]) -> anyhow::Result<()> {
        let [cars, bikes, trucks] = args else {
            return Err(usage("init <cars> <bikes> <trucks>"));
        };
        let counts = ClassMap::new(
            parse_count::<u32>(cars, "car slot count")?,
            parse_count::<u32>(bikes, "bike slot count")?,
            parse_count::<u32>(trucks, "truck slot count")?,
        );

        self.engine.initialize(&counts)?;
        writeln!(
            self.output,
            "✅ Parking initialized: Total slots = {}  (Cars: {}, Bikes: {}, Trucks: {})",
            self.engine.total_slots(),
            counts.car,
            counts.bike,
            counts.truck
        )?;
        Ok(())
    }
}

fn usage(text: &str) -> anyhow::Error {
    Error::InvalidArgument(format!("Usage: {}", text)).into()
}

/// Parse a non-negative integer token
fn parse_count<T>(token: &str, what: &str) -> Result<T, Error>
where
    T: std::str::FromStr + Default + PartialOrd,
{
    match token.parse::<T>() {
        Ok(value) if value >= T::default() => Ok(value),
        _ => Err(Error::InvalidArgument(format!(
            "Please enter a non-negative number for {} (got '{}')",
            what, token
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn session(engine: AllocationEngine, script: &str) -> (AllocationEngine, String) {
        let mut shell = Shell::new(engine, Cursor::new(script.to_string()), Vec::new());
        shell.run().expect("session should succeed");
        let (engine, out) = shell.into_parts();
        (engine, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_entry_exit_handoff_rendering() {
        let engine = AllocationEngine::new(&ClassMap::new(1, 0, 0));
        let (engine, out) = session(
            engine,
            "entry V1 car\nentry V2 car\nexit V1 90\nquit\nentry V3 car\n",
        );

        assert!(out.contains("Ticket: T1  | Vehicle: V1 | Type: CAR | Slot#: 1"));
        assert!(out.contains("Added to waitlist position 1"));
        assert!(out.contains("Duration: 90 minutes (2 hour(s) billed)"));
        assert!(out.contains("Amount  : 100.00"));
        assert!(out.contains("Freed slot 1 assigned to waitlisted vehicle \"V2\" | New Ticket: T2"));
        // Nothing after quit is executed
        assert!(engine.waiting_position("V3").is_none());
        assert!(out.ends_with("👋 Goodbye!\n"));
    }

    #[test]
    fn test_invalid_input_keeps_going() {
        let engine = AllocationEngine::new(&ClassMap::new(1, 1, 1));
        let (engine, out) = session(
            engine,
            "entry V1 bus\nexit V1 -5\nexit V1 abc\nrate car -3\nfly\nentry V1\n\nentry V1 b\n",
        );

        assert!(out.contains("Unknown vehicle class 'bus'"));
        assert!(out.contains("non-negative number for duration"));
        assert!(out.contains("Rate must be a non-negative number"));
        assert!(out.contains("Unknown command 'fly'"));
        assert!(out.contains("Usage: entry"));
        assert_eq!(engine.rates().car, 50.0);
        assert!(engine.parked("V1").is_some());
    }

    #[test]
    fn test_reports() {
        let engine = AllocationEngine::new(&ClassMap::new(1, 1, 0));
        let (_, out) = session(
            engine,
            "in C1 c\nin C2 c\nrate bike 25\navailability\nstats\nlayout\nexit NOPE 10\n",
        );

        assert!(out.contains("Free total = 1  (Cars: 0, Bikes: 1, Trucks: 0)"));
        assert!(out.contains("Slot 1 | CAR | Vehicle: C1 | Ticket: T1"));
        assert!(out.contains("1. C2 (CAR)"));
        assert!(out.contains("Occupancy percent     : 50.00%"));
        assert!(out.contains("Rates per hour        : CAR=50.00, BIKE=25.00, TRUCK=100.00"));
        assert!(out.contains("  1 : CAR : OCC - C1"));
        assert!(out.contains("  2 : BIKE : FREE"));
        assert!(out.contains("Vehicle \"NOPE\" not found."));
    }

    #[test]
    fn test_init_command() {
        let (engine, out) = session(AllocationEngine::default(), "init 2 1 0\nentry T9 truck\n");
        assert!(out.contains("Total slots = 3  (Cars: 2, Bikes: 1, Trucks: 0)"));
        assert_eq!(
            engine.waiting_position("T9"),
            Some((VehicleClass::HeavyGoods, 1))
        );
    }

    #[test]
    fn test_oversized_init_is_reported() {
        let engine = AllocationEngine::new(&ClassMap::new(1, 0, 0)).with_max_slots(100);
        let (engine, out) = session(
            engine,
            "entry V1 car\ninit 4294967295 4294967295 4294967295\ninit 60 40 1\n",
        );

        assert!(out.contains("Facility of 12884901885 slots exceeds the limit of 100"));
        assert!(out.contains("Facility of 101 slots exceeds the limit of 100"));
        assert_eq!(engine.total_slots(), 1);
        assert!(engine.parked("V1").is_some());
        assert!(out.ends_with("👋 Goodbye!\n"));
    }

    #[test]
    fn test_already_parked_message() {
        let (_, out) = session(
            AllocationEngine::new(&ClassMap::new(2, 0, 0)),
            "entry V1 car\nentry V1 car\n",
        );
        assert!(out.contains("Vehicle \"V1\" already parked in slot 1"));
    }
}
