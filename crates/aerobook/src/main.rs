//! `aerobook` - CLI for the aircraft booking service.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use anyhow::{bail, Context};
use chrono::{FixedOffset, Local};
use clap::Parser;

use aerobook::cli::{
    delete_scope, BookCommand, Cli, Command, ConfigCommand, DayArgs, ExportCommand, OutputFormat,
    UserCommand,
};
use aerobook::export::{calendar_file_name, event_file_name};
use aerobook::layout::short_name;
use aerobook::{init_logging, Actor, Booking, BookingService, Config, Role, TimeSlot, User};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbosity());

    let config = Config::load_from(cli.config.clone()).context("failed to load configuration")?;

    match cli.command {
        Command::Config(cmd) => handle_config(&config, cmd),
        Command::Init { guest_name } => handle_init(config, &guest_name),
        command => {
            let service = BookingService::open(config).context("failed to open booking database")?;
            run(&service, cli.user.as_deref(), command)
        }
    }
}

fn run(service: &BookingService, user: Option<&str>, command: Command) -> anyhow::Result<()> {
    match command {
        Command::User(cmd) => handle_user(service, cmd),
        Command::Book(cmd) => handle_book(service, user, cmd),
        Command::Day(args) => handle_day(service, &args),
        Command::Layout(args) => handle_layout(service, &args),
        Command::Free(args) => handle_free(service, &args),
        Command::Export(cmd) => handle_export(service, cmd),
        Command::Config(_) | Command::Init { .. } => Ok(()),
    }
}

/// Resolve `--as` to an actor with the account's stored role.
fn actor(service: &BookingService, user: Option<&str>) -> anyhow::Result<Actor> {
    let Some(id) = user else {
        bail!("this command needs --as <USER_ID>");
    };
    let account = service
        .storage()
        .get_user(id)?
        .with_context(|| format!("unknown account {id:?}"))?;
    Ok(Actor::new(account.id, account.role))
}

fn handle_init(config: Config, guest_name: &str) -> anyhow::Result<()> {
    let service = BookingService::open(config).context("failed to create booking database")?;
    let email = service.config().guest.account_email.clone();

    if service.storage().find_guest_account(&email)?.is_none() {
        service.storage().insert_user(&User {
            id: "guest".to_string(),
            full_name: guest_name.to_string(),
            email: email.clone(),
            phone: None,
            role: Role::Guest,
        })?;
        println!("Created guest account {email}");
    }
    println!("Database ready at {}", service.storage().path().display());
    Ok(())
}

fn handle_user(service: &BookingService, cmd: UserCommand) -> anyhow::Result<()> {
    match cmd {
        UserCommand::Add {
            id,
            name,
            email,
            phone,
            role,
        } => {
            let user = User {
                id,
                full_name: name,
                email,
                phone,
                role: role.into(),
            };
            service
                .storage()
                .insert_user(&user)
                .with_context(|| format!("failed to add account {}", user.id))?;
            println!(
                "Added {} {} ({})",
                user.role.display_name(),
                user.id,
                user.full_name
            );
        }
    }
    Ok(())
}

fn handle_book(service: &BookingService, user: Option<&str>, cmd: BookCommand) -> anyhow::Result<()> {
    let offset = service.rules().offset();
    match &cmd {
        BookCommand::Add(args) => {
            let actor = actor(service, user)?;
            let id = service.add_booking(&args.to_request(), &actor)?;
            println!("Created booking {id}");
        }
        BookCommand::Guest { booking, .. } => {
            let contact = cmd.contact().context("missing contact details")?;
            let id = service.add_guest_booking(&booking.to_request(), &contact)?;
            println!("Created guest booking {id}");
        }
        BookCommand::Repeat { booking, until } => {
            let actor = actor(service, user)?;
            let series = service.add_repeating_bookings(&booking.to_request(), until, &actor)?;
            println!(
                "Created {} bookings in series {}",
                series.ids.len(),
                series.group
            );
        }
        BookCommand::Update { id, booking } => {
            let actor = actor(service, user)?;
            let updated = service.update_booking(*id, &booking.to_request(), &actor)?;
            println!("Updated {}", describe(&updated, offset));
        }
        BookCommand::Remove { id, following } => {
            let actor = actor(service, user)?;
            let deleted = service.remove_booking(*id, &actor, delete_scope(*following))?;
            println!("Deleted {deleted} booking(s)");
        }
        BookCommand::Show { id, json } => {
            let booking = service.booking(*id)?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&booking)?);
            } else {
                println!("{}", describe(&booking, offset));
                if !booking.description.is_empty() {
                    println!("  {}", booking.description);
                }
            }
        }
        BookCommand::List { owner, json } => {
            let actor = actor(service, user)?;
            let bookings = service.user_bookings(owner.as_deref(), &actor)?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&bookings)?);
            } else {
                for booking in &bookings {
                    println!("{}", describe(booking, offset));
                }
            }
        }
        BookCommand::Contact { id } => {
            let actor = actor(service, user)?;
            match service.guest_contact(*id, &actor)? {
                Some(contact) => {
                    println!("Name:  {}", contact.name);
                    println!("Email: {}", contact.email);
                    println!("Phone: {}", contact.phone);
                }
                None => println!("Booking {id} is not a guest booking"),
            }
        }
    }
    Ok(())
}

fn local_time(slot: &TimeSlot, offset: FixedOffset) -> String {
    format!(
        "{}-{}",
        slot.start().with_timezone(&offset).format("%Y-%m-%d %H:%M"),
        slot.end().with_timezone(&offset).format("%H:%M")
    )
}

fn describe(booking: &Booking, offset: FixedOffset) -> String {
    format!(
        "#{} {} {} {} \"{}\" ({})",
        booking.id,
        booking.aircraft,
        local_time(&booking.slot, offset),
        booking.flight_type.label(),
        booking.title,
        booking.full_name
    )
}

fn handle_day(service: &BookingService, args: &DayArgs) -> anyhow::Result<()> {
    let rows = service.hour_rows(&args.plane, &args.date)?;
    if args.format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    println!("{} {}", args.plane, args.date);
    for row in rows {
        let cells: Vec<String> = row
            .bookings
            .iter()
            .map(|b| format!("{} [{}]", b.title, short_name(&b.full_name)))
            .collect();
        println!("{:>6}  {}", row.label, cells.join(" | "));
    }
    Ok(())
}

fn handle_layout(service: &BookingService, args: &DayArgs) -> anyhow::Result<()> {
    let view = service.day_view(&args.plane, &args.date)?;
    if args.format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    let offset = service.rules().offset();
    println!("{} {}: {} column(s)", args.plane, view.date, view.columns);
    for entry in &view.entries {
        println!(
            "  [{}] {}{}{} #{} {} ({})",
            entry.column,
            if entry.continues_before { "<- " } else { "" },
            local_time(&entry.shown, offset),
            if entry.continues_after { " ->" } else { "" },
            entry.booking.id,
            entry.booking.title,
            entry.label
        );
    }
    Ok(())
}

fn handle_free(service: &BookingService, args: &DayArgs) -> anyhow::Result<()> {
    let free = service.free_slots(&args.plane, &args.date)?;
    if args.format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&free)?);
        return Ok(());
    }

    let offset = service.rules().offset();
    if free.is_empty() {
        println!("{} is fully booked on {}", args.plane, args.date);
    }
    for slot in &free {
        println!("  {}", local_time(slot, offset));
    }
    Ok(())
}

fn handle_export(service: &BookingService, cmd: ExportCommand) -> anyhow::Result<()> {
    let (ics, file_name) = match (cmd.booking, cmd.from.as_deref()) {
        (Some(id), _) => (
            service.export_booking(id)?,
            event_file_name(&service.booking(id)?),
        ),
        (None, Some(from)) => {
            let to = cmd.to.as_deref().unwrap_or(from);
            (
                service.export_range(cmd.plane.as_deref(), from, to)?,
                calendar_file_name(Local::now().date_naive()),
            )
        }
        (None, None) => bail!("export needs --booking or --from"),
    };

    match cmd.output {
        Some(path) => {
            let path = if path.is_dir() { path.join(file_name) } else { path };
            std::fs::write(&path, ics)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Wrote {}", path.display());
        }
        None => print!("{ics}"),
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:      {}", config.database_path().display());
                println!();
                println!("[Fleet]");
                println!("  Aircraft:           {}", config.fleet.aircraft.join(", "));
                println!();
                println!("[Guest]");
                println!("  Account email:      {}", config.guest.account_email);
                println!();
                println!("[Booking]");
                println!("  Allow overlapping:  {}", config.booking.allow_overlapping);
                println!("  Min duration (min): {}", config.booking.min_duration_minutes);
                println!("  Whole hours only:   {}", config.booking.whole_hours_only);
                println!("  Max repeat days:    {}", config.booking.max_repeat_days);
                println!();
                println!("[Calendar]");
                println!("  UTC offset (min):   {}", config.calendar.utc_offset_minutes);
                println!(
                    "  Hours:              {}:00-{}:00",
                    config.calendar.first_hour, config.calendar.last_hour
                );
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
