use yoviajo_client::{CardView, Outcome};
use yoviajo_core::payloads::AdminStats;
use yoviajo_core::{Booking, CardEntity, PenaltyNotice, Role, TripCost, User};

pub fn role_label(role: &Role) -> &str {
    match role {
        Role::Driver => "driver",
        Role::Passenger => "passenger",
        Role::Admin => "admin",
        Role::Other(raw) => raw,
    }
}

pub fn user(user: &User) {
    println!("#{} {} ({})", user.id, user.name, role_label(&user.role));
    println!("  reputation: {}", user.reputation_score);
    println!("  verified:   {}", if user.is_verified { "yes" } else { "no" });
    if let Some(car) = &user.car_model {
        println!("  car:        {} {}", car, user.car_plate.as_deref().unwrap_or(""));
    }
}

fn kind(entity: &CardEntity) -> String {
    match entity {
        CardEntity::Offer(r) => format!("ride #{}", r.id),
        CardEntity::Request(r) => format!("request #{}", r.id),
        CardEntity::Booking(b) => format!("booking #{} ({:?})", b.id, b.status),
        CardEntity::Match(m) => format!("match {}% ride #{} / request #{}", m.match_score, m.ride_id, m.request_id),
    }
}

pub fn cards(cards: &[CardView]) {
    if cards.is_empty() {
        println!("Nothing to show.");
        return;
    }
    for card in cards {
        let s = &card.summary;
        println!("[{}] {}", kind(&card.entity), s.title);

        let mut when = s.date.clone();
        if let Some(time) = &s.time {
            when.push(' ');
            when.push_str(time);
        }
        if let Some(countdown) = &s.countdown {
            when.push_str(&format!("  {}", countdown));
        }
        println!("    {}", when);

        match s.estimated_liters {
            Some(liters) => println!("    ~{} L of fuel{}", liters, if s.shows_fee_notice { " + 10% fee" } else { "" }),
            None => println!("    price to be agreed"),
        }
        if let Some(interest) = s.bookings_interest {
            println!("    {} interested", interest);
        }

        match &card.action {
            Some(button) if button.enabled => println!("    > {}", button.label()),
            Some(button) => println!("    > ({})", button.label()),
            None => {}
        }
        println!("    route: {}", card.route_url);
    }
}

pub fn trip_cost(cost: &TripCost) {
    println!("{} seat(s), {:.1} L of fuel", cost.seats, cost.total_liters);
    println!("  fuel, paid to the driver: ${:.0}", cost.fuel_cost);
    println!("  reservation fee, paid now: ${:.0}", cost.platform_fee);
}

pub fn notice(notice: &PenaltyNotice) {
    println!("{}: {}", notice.headline(), notice.message());
}

pub fn manifest(bookings: &[Booking]) {
    if bookings.is_empty() {
        println!("No passengers yet.");
        return;
    }
    for b in bookings {
        println!(
            "#{} {} - {} seat(s) - {:?}/{:?} {}",
            b.id,
            b.passenger_name.as_deref().unwrap_or("passenger"),
            b.seats_booked,
            b.status,
            b.payment_status,
            b.passenger_phone.as_deref().unwrap_or("")
        );
    }
}

pub fn users(users: &[User]) {
    for u in users {
        println!(
            "#{} {} {} ({}) rep={} {}",
            u.id,
            u.name,
            u.dni.as_deref().unwrap_or("-"),
            role_label(&u.role),
            u.reputation_score,
            u.verification_status.as_deref().unwrap_or("")
        );
    }
}

pub fn stats(stats: &AdminStats) {
    println!(
        "users {} | rides {} ({} active) | bookings {}",
        stats.total_users, stats.total_rides, stats.active_rides, stats.total_bookings
    );
}

pub fn outcome(outcome: &Outcome) {
    match outcome {
        Outcome::Reserved { booking, .. } => println!("Booking {} created.", booking.id),
        Outcome::BookingCancelled(b) => println!("Booking {} cancelled.", b.id),
        Outcome::Reported(r) => println!("{}", r.message.as_deref().unwrap_or("Report sent.")),
        Outcome::Invited(ack) => println!("{}", ack.message.as_deref().unwrap_or("Invitation sent.")),
        Outcome::RidePublished(r) => println!("Ride {} published.", r.id),
        Outcome::RequestPublished(r) => println!("Request {} published.", r.id),
        Outcome::RideCancelled(c) => {
            println!("{}", c.message.as_deref().unwrap_or("Ride cancelled."));
            if c.penalty_applied {
                if let Some(rep) = c.new_reputation {
                    println!("Your reputation is now {}.", rep);
                }
            }
        }
        Outcome::RequestDeleted => println!("Request deleted."),
        Outcome::Reviewed(r) => println!("Thanks, rated {} stars.", r.rating),
    }
}
