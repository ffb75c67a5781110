//! The featured event attendees register for.

use serde::Serialize;

use crate::queue::Event;

/// Full event listing shown to attendees.
///
/// Only the fields of [`Event`] travel with a notification; speakers and
/// capacity are display data.
#[derive(Debug, Clone, Serialize)]
pub struct EventListing {
    pub title: String,
    pub date: String,
    pub time: String,
    pub location: String,
    pub address: String,
    pub description: String,
    pub speakers: Vec<String>,
    pub price: String,
    pub capacity: u32,
    pub registered: u32,
}

impl EventListing {
    /// The event as carried in a ticket message.
    pub fn to_event(&self) -> Event {
        Event {
            name: self.title.clone(),
            date: self.date.clone(),
            time: self.time.clone(),
            location: self.location.clone(),
            address: self.address.clone(),
            description: self.description.clone(),
            price: self.price.clone(),
        }
    }

    pub fn seats_left(&self) -> u32 {
        self.capacity.saturating_sub(self.registered)
    }
}

/// The event currently open for registration.
pub fn featured_event() -> EventListing {
    EventListing {
        title: "Tech Conference 2024".to_string(),
        date: "December 15, 2024".to_string(),
        time: "09:00 - 18:00".to_string(),
        location: "São Paulo Convention Center".to_string(),
        address: "Av. Paulista, 1000 - Bela Vista, São Paulo - SP".to_string(),
        description: "The biggest technology conference in Brazil. Come discover the latest \
                      trends in development, AI, cloud computing and much more."
            .to_string(),
        speakers: vec![
            "Dr. Ana Silva - AI Specialist".to_string(),
            "João Santos - CTO at TechCorp".to_string(),
            "Maria Costa - Product Leader".to_string(),
            "Pedro Oliveira - Software Architect".to_string(),
        ],
        price: "$299.00".to_string(),
        capacity: 500,
        registered: 342,
    }
}
