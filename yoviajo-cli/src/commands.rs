use anyhow::{anyhow, bail, Context};
use chrono::Utc;
use yoviajo_client::dispatcher::Reload;
use yoviajo_client::trips::{booking_cancellation_notice, no_show_notice};
use yoviajo_client::{
    ActionDispatcher, ApiClient, Config, CountdownTicker, Dashboard, Intent, LoginOutcome, MyTrips, Outcome, StatsPoller,
};
use yoviajo_core::clock::parse_server_timestamp;
use yoviajo_core::payloads::{
    Credentials, MatchInvite, NewRide, NewRideRequest, Page, Registration, ReviewCreate, VerificationDecision,
    VerificationStatus,
};
use yoviajo_core::{Booking, ListingFilter, PenaltyNotice, Ride, TripCost};
use yoviajo_shared::Masked;

use crate::render;
use crate::{AdminCommand, Command};

const ADMIN_PAGE_SIZE: u32 = 20;

pub async fn execute(command: Command, api: ApiClient, config: &Config) -> anyhow::Result<()> {
    let dispatcher = ActionDispatcher::new(api.clone());
    let trips = MyTrips::new(api.clone());

    match command {
        Command::Login { dni, password, role } => {
            let credentials = Credentials { dni, password: Masked::new(password), role };
            match api.login(&credentials).await? {
                LoginOutcome::LoggedIn(user) => println!("Welcome, {} ({})", user.name, render::role_label(&user.role)),
                LoginOutcome::RoleChoice(choice) => {
                    println!("{}", choice.detail.as_deref().unwrap_or("This DNI has several accounts."));
                    for option in choice.roles_available {
                        println!("  --role {}  {}", option.role, option.label);
                    }
                }
            }
        }

        Command::Register { name, email, dni, password, role, gender, car_model, car_plate } => {
            let form = Registration {
                name,
                email,
                dni,
                password: Masked::new(password),
                role,
                gender,
                car_model,
                car_plate,
                prefs_luggage: true,
                ..Default::default()
            };
            let user = api.register(&form).await?;
            println!("Account {} created. You can log in now.", user.id);
        }

        Command::Logout => {
            api.logout().await?;
            println!("Logged out.");
        }

        Command::Whoami => match api.session().current_user().await {
            Some(_) => render::user(&api.me().await?),
            None => println!("Not logged in."),
        },

        Command::Market { origin, destination, date } => {
            let dashboard = Dashboard::new(api.clone());
            dashboard.reload().await;
            let filter = ListingFilter { origin, destination, date };
            render::cards(&dashboard.cards(&filter, Utc::now()).await);
        }

        Command::Trips => {
            trips.reload().await;
            render::cards(&trips.cards(Utc::now()).await);
        }

        Command::Reserve { ride_id, seats } => {
            let ride = find_ride(&api.list_rides().await?, ride_id)?;
            let cost = TripCost::for_ride(&ride, seats)?;
            render::trip_cost(&cost);

            match dispatcher.dispatch(Intent::Reserve { ride_id, seats }, &trips).await? {
                Outcome::Reserved { booking, payment } => {
                    println!("Booking {} created ({:?}).", booking.id, booking.status);
                    match payment {
                        Ok(pref) => println!("Pay the reservation fee at: {}", pref.init_point),
                        Err(e) => println!("Could not start the payment: {}", e.user_message()),
                    }
                }
                other => render::outcome(&other),
            }
        }

        Command::CancelBooking { booking_id, yes } => {
            let booking = find_booking(&api.my_bookings().await?, booking_id)?;
            let notice = booking_cancellation_notice(&booking, Utc::now())?;
            if confirm(&notice, yes) {
                let outcome = dispatcher.dispatch(Intent::CancelBooking { booking_id }, &trips).await?;
                render::outcome(&outcome);
            }
        }

        Command::Report { booking_id, yes } => {
            let booking = find_booking(&api.my_bookings().await?, booking_id)?;
            let notice = no_show_notice(&booking, Utc::now())?;
            if confirm(&notice, yes) {
                let outcome = dispatcher.dispatch(Intent::ReportAbsence { booking }, &trips).await?;
                render::outcome(&outcome);
            }
        }

        Command::Review { booking_id, rating, comment } => {
            let review = ReviewCreate::new(booking_id, rating, comment)?;
            let outcome = dispatcher.dispatch(Intent::Review(review), &trips).await?;
            render::outcome(&outcome);
        }

        Command::PublishRide { origin, destination, departure, price, seats } => {
            let ride = NewRide::new(origin, destination, departure, price, seats);
            let outcome = dispatcher.dispatch(Intent::PublishRide(ride), &trips).await?;
            render::outcome(&outcome);
        }

        Command::CancelRide { ride_id, yes } => {
            let ride = find_ride(&api.my_rides().await?, ride_id)?;
            let notice = trips.ride_cancellation_notice(&ride, Utc::now()).await?;
            if confirm(&notice, yes) {
                let outcome = dispatcher.dispatch(Intent::CancelRide { ride_id }, &trips).await?;
                render::outcome(&outcome);
            }
        }

        Command::Manifest { ride_id } => render::manifest(&trips.manifest(ride_id).await?),

        Command::RequestRide { origin, destination, date, from, to, price } => {
            let request = NewRideRequest {
                origin,
                destination,
                date,
                is_flexible: from.is_none() && to.is_none(),
                time_window_start: from,
                time_window_end: to,
                proposed_price: price,
                origin_reference: None,
                destination_reference: None,
            };
            let outcome = dispatcher.dispatch(Intent::PublishRequest(request), &trips).await?;
            render::outcome(&outcome);
        }

        Command::DeleteRequest { request_id } => {
            let outcome = dispatcher.dispatch(Intent::DeleteRequest { request_id }, &trips).await?;
            render::outcome(&outcome);
        }

        Command::Invite { ride_id, request_id, user_id } => {
            let invite = MatchInvite { ride_id, request_id, target_user_id: user_id };
            let dashboard = Dashboard::new(api.clone());
            let outcome = dispatcher.dispatch(Intent::Invite(invite), &dashboard).await?;
            render::outcome(&outcome);
        }

        Command::Countdown { departure, watch } => {
            let target = parse_server_timestamp(&departure)?;
            let ticker = CountdownTicker::start(target, config.countdown_period());
            println!("{}", ticker.current());

            if watch {
                let mut rx = ticker.subscribe();
                while rx.changed().await.is_ok() {
                    let display = *rx.borrow_and_update();
                    println!("{}", display);
                    if display.is_expired() {
                        break;
                    }
                }
            }
        }

        Command::Places { query } => {
            for place in api.autocomplete(&query).await? {
                println!("{}  ({:.4}, {:.4})", place.label, place.lat, place.lng);
            }
        }

        Command::Admin(admin) => execute_admin(admin, api, config).await?,
    }

    Ok(())
}

async fn execute_admin(command: AdminCommand, api: ApiClient, config: &Config) -> anyhow::Result<()> {
    match command {
        AdminCommand::Stats { watch: false } => render::stats(&api.admin_stats().await?),
        AdminCommand::Stats { watch: true } => {
            let poller = StatsPoller::start(api, config.admin_stats_period());
            let mut rx = poller.subscribe();
            loop {
                tokio::select! {
                    changed = rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let latest = rx.borrow_and_update().clone();
                        if let Some(stats) = latest {
                            render::stats(&stats);
                        }
                    }
                    _ = tokio::signal::ctrl_c() => break,
                }
            }
        }
        AdminCommand::Users { pending: true, .. } => render::users(&api.admin_pending_verifications().await?),
        AdminCommand::Users { page, pending: false } => {
            render::users(&api.admin_users(Page::new(page, ADMIN_PAGE_SIZE)).await?)
        }
        AdminCommand::Rides { page } => {
            for ride in api.admin_rides(Page::new(page, ADMIN_PAGE_SIZE)).await? {
                println!("#{} {} → {} {} ({:?})", ride.id, ride.origin, ride.destination, ride.departure_time, ride.status);
            }
        }
        AdminCommand::Bookings { page } => render::manifest(&api.admin_bookings(Page::new(page, ADMIN_PAGE_SIZE)).await?),
        AdminCommand::Logs { page } => {
            for entry in api.admin_logs(Page::new(page, ADMIN_PAGE_SIZE)).await? {
                println!(
                    "{} {} user={} {}",
                    entry.timestamp.as_deref().unwrap_or("-"),
                    entry.action,
                    entry.user_id.map(|id| id.to_string()).unwrap_or_else(|| "-".into()),
                    entry.details
                );
            }
        }
        AdminCommand::Verify { user_id, reject } => {
            let status = if reject { VerificationStatus::Rejected } else { VerificationStatus::Approved };
            let ack = api.admin_verify_user(user_id, VerificationDecision { status }).await?;
            println!("{}", ack.message.as_deref().unwrap_or("Done."));
        }
    }
    Ok(())
}

fn confirm(notice: &PenaltyNotice, yes: bool) -> bool {
    render::notice(notice);
    if !yes {
        println!("Re-run with --yes to {}.", notice.confirm_label().to_lowercase());
    }
    yes
}

fn find_ride(rides: &[Ride], ride_id: i64) -> anyhow::Result<Ride> {
    rides.iter().find(|r| r.id == ride_id).cloned().ok_or_else(|| anyhow!("ride {} not found", ride_id))
}

fn find_booking(bookings: &[Booking], booking_id: i64) -> anyhow::Result<Booking> {
    let booking = bookings
        .iter()
        .find(|b| b.id == booking_id)
        .cloned()
        .with_context(|| format!("booking {} is not one of yours", booking_id))?;
    if booking.is_cancelled() {
        bail!("booking {} is already cancelled", booking_id);
    }
    Ok(booking)
}
