use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

use super::Rank;

/// Numbers on a ticket (and winning numbers in a draw).
pub const TICKET_SIZE: usize = 6;
pub const MIN_NUMBER: u8 = 1;
pub const MAX_NUMBER: u8 = 45;
/// Price of a single ticket.
pub const TICKET_PRICE: i64 = 1_000;

#[derive(Debug, ThisError, Clone, PartialEq, Eq)]
pub enum TicketError {
    #[error(
        "number out of range (got={number}, min={min}, max={max})",
        min = MIN_NUMBER,
        max = MAX_NUMBER
    )]
    NumberOutOfRange { number: u8 },
    #[error("duplicate number {number}")]
    DuplicateNumber { number: u8 },
    #[error("bonus number {bonus} is already a winning number")]
    BonusCollision { bonus: u8 },
}

#[derive(Debug, ThisError, Clone, PartialEq, Eq)]
pub enum PurchaseError {
    #[error("purchase amount must be positive (got={amount})")]
    NonPositive { amount: i64 },
    #[error("purchase amount must be a multiple of {price} (got={amount})")]
    NotMultiple { amount: i64, price: i64 },
}

fn check_number(number: u8) -> Result<(), TicketError> {
    if !(MIN_NUMBER..=MAX_NUMBER).contains(&number) {
        return Err(TicketError::NumberOutOfRange { number });
    }
    Ok(())
}

/// Six distinct numbers, kept sorted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "[u8; 6]", into = "[u8; 6]")]
pub struct Ticket {
    numbers: [u8; TICKET_SIZE],
}

impl Ticket {
    pub fn new(mut numbers: [u8; TICKET_SIZE]) -> Result<Self, TicketError> {
        numbers.sort_unstable();
        for number in numbers {
            check_number(number)?;
        }
        if let Some(pair) = numbers.windows(2).find(|pair| pair[0] == pair[1]) {
            return Err(TicketError::DuplicateNumber { number: pair[0] });
        }
        Ok(Self { numbers })
    }

    /// Quick-pick ticket.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut numbers = [0u8; TICKET_SIZE];
        let picks = rand::seq::index::sample(rng, MAX_NUMBER as usize, TICKET_SIZE);
        for (slot, index) in numbers.iter_mut().zip(picks.iter()) {
            *slot = index as u8 + MIN_NUMBER;
        }
        numbers.sort_unstable();
        Self { numbers }
    }

    pub fn numbers(&self) -> &[u8; TICKET_SIZE] {
        &self.numbers
    }

    pub fn contains(&self, number: u8) -> bool {
        self.numbers.binary_search(&number).is_ok()
    }
}

impl TryFrom<[u8; TICKET_SIZE]> for Ticket {
    type Error = TicketError;

    fn try_from(numbers: [u8; TICKET_SIZE]) -> Result<Self, Self::Error> {
        Ticket::new(numbers)
    }
}

impl From<Ticket> for [u8; TICKET_SIZE] {
    fn from(ticket: Ticket) -> Self {
        ticket.numbers
    }
}

#[derive(Clone, Copy, Serialize, Deserialize)]
struct DrawRepr {
    numbers: [u8; TICKET_SIZE],
    bonus: u8,
}

/// Winning numbers plus a bonus number drawn from the remaining balls.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "DrawRepr", into = "DrawRepr")]
pub struct Draw {
    winning: Ticket,
    bonus: u8,
}

impl Draw {
    pub fn new(numbers: [u8; TICKET_SIZE], bonus: u8) -> Result<Self, TicketError> {
        let winning = Ticket::new(numbers)?;
        check_number(bonus)?;
        if winning.contains(bonus) {
            return Err(TicketError::BonusCollision { bonus });
        }
        Ok(Self { winning, bonus })
    }

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let picks = rand::seq::index::sample(rng, MAX_NUMBER as usize, TICKET_SIZE + 1).into_vec();
        let mut numbers = [0u8; TICKET_SIZE];
        for (slot, index) in numbers.iter_mut().zip(&picks) {
            *slot = *index as u8 + MIN_NUMBER;
        }
        numbers.sort_unstable();
        Self {
            winning: Ticket { numbers },
            bonus: picks[TICKET_SIZE] as u8 + MIN_NUMBER,
        }
    }

    pub fn winning(&self) -> &Ticket {
        &self.winning
    }

    pub fn bonus(&self) -> u8 {
        self.bonus
    }

    pub fn match_count(&self, ticket: &Ticket) -> usize {
        ticket
            .numbers()
            .iter()
            .filter(|number| self.winning.contains(**number))
            .count()
    }

    /// Tier a ticket wins in this draw.
    pub fn rank_of(&self, ticket: &Ticket) -> Rank {
        Rank::from_matches(self.match_count(ticket), ticket.contains(self.bonus))
    }
}

impl TryFrom<DrawRepr> for Draw {
    type Error = TicketError;

    fn try_from(repr: DrawRepr) -> Result<Self, Self::Error> {
        Draw::new(repr.numbers, repr.bonus)
    }
}

impl From<Draw> for DrawRepr {
    fn from(draw: Draw) -> Self {
        DrawRepr {
            numbers: draw.winning.numbers,
            bonus: draw.bonus,
        }
    }
}

/// A participant and the tickets they hold for a round.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub name: String,
    pub tickets: Vec<Ticket>,
}

impl Player {
    pub fn new(name: impl Into<String>, tickets: Vec<Ticket>) -> Self {
        Self {
            name: name.into(),
            tickets,
        }
    }

    /// Amount this player paid for their tickets.
    pub fn spent(&self) -> i64 {
        (self.tickets.len() as i64).saturating_mul(TICKET_PRICE)
    }
}

/// Buy `amount / TICKET_PRICE` quick-pick tickets.
pub fn purchase<R: Rng + ?Sized>(amount: i64, rng: &mut R) -> Result<Vec<Ticket>, PurchaseError> {
    if amount <= 0 {
        return Err(PurchaseError::NonPositive { amount });
    }
    if amount % TICKET_PRICE != 0 {
        return Err(PurchaseError::NotMultiple {
            amount,
            price: TICKET_PRICE,
        });
    }
    let count = (amount / TICKET_PRICE) as usize;
    Ok((0..count).map(|_| Ticket::random(rng)).collect())
}
