use std::fmt;

use once_cell::sync::Lazy;

use crate::error::{CfrError, CfrResult};

/// Number of cards in a full deck; also the width of a `CardSet`.
pub const DECK_SIZE: usize = 52;

/// Card ranks in rummy order: aces are low.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Rank {
    Ace = 1,
    Two = 2,
    Three = 3,
    Four = 4,
    Five = 5,
    Six = 6,
    Seven = 7,
    Eight = 8,
    Nine = 9,
    Ten = 10,
    Jack = 11,
    Queen = 12,
    King = 13,
}

impl Rank {
    pub fn from_char(c: char) -> CfrResult<Rank> {
        match c {
            'A' => Ok(Rank::Ace),
            '2' => Ok(Rank::Two),
            '3' => Ok(Rank::Three),
            '4' => Ok(Rank::Four),
            '5' => Ok(Rank::Five),
            '6' => Ok(Rank::Six),
            '7' => Ok(Rank::Seven),
            '8' => Ok(Rank::Eight),
            '9' => Ok(Rank::Nine),
            'T' => Ok(Rank::Ten),
            'J' => Ok(Rank::Jack),
            'Q' => Ok(Rank::Queen),
            'K' => Ok(Rank::King),
            _ => Err(CfrError::InvalidRank(c)),
        }
    }

    pub fn to_char(self) -> char {
        match self {
            Rank::Ace => 'A',
            Rank::Two => '2',
            Rank::Three => '3',
            Rank::Four => '4',
            Rank::Five => '5',
            Rank::Six => '6',
            Rank::Seven => '7',
            Rank::Eight => '8',
            Rank::Nine => '9',
            Rank::Ten => 'T',
            Rank::Jack => 'J',
            Rank::Queen => 'Q',
            Rank::King => 'K',
        }
    }

    pub fn value(self) -> u8 {
        self as u8
    }

    /// Deadwood points: face value, face cards count ten.
    pub fn deadwood(self) -> u32 {
        (self.value() as u32).min(10)
    }
}

pub const ALL_RANKS: [Rank; 13] = [
    Rank::Ace,
    Rank::Two,
    Rank::Three,
    Rank::Four,
    Rank::Five,
    Rank::Six,
    Rank::Seven,
    Rank::Eight,
    Rank::Nine,
    Rank::Ten,
    Rank::Jack,
    Rank::Queen,
    Rank::King,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Suit {
    Spades,
    Hearts,
    Diamonds,
    Clubs,
}

impl Suit {
    pub fn from_char(c: char) -> CfrResult<Suit> {
        match c.to_ascii_lowercase() {
            's' => Ok(Suit::Spades),
            'h' => Ok(Suit::Hearts),
            'd' => Ok(Suit::Diamonds),
            'c' => Ok(Suit::Clubs),
            _ => Err(CfrError::InvalidSuit(c)),
        }
    }

    pub fn to_char(self) -> char {
        match self {
            Suit::Spades => 's',
            Suit::Hearts => 'h',
            Suit::Diamonds => 'd',
            Suit::Clubs => 'c',
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Suit::Spades => "\u{2660}",
            Suit::Hearts => "\u{2665}",
            Suit::Diamonds => "\u{2666}",
            Suit::Clubs => "\u{2663}",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

pub const ALL_SUITS: [Suit; 4] = [Suit::Spades, Suit::Hearts, Suit::Diamonds, Suit::Clubs];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Card {
    pub rank: Rank,
    pub suit: Suit,
}

impl Card {
    pub fn new(rank: Rank, suit: Suit) -> Card {
        Card { rank, suit }
    }

    /// Position of this card in a `CardSet`: suit-major, ace first.
    pub fn index(&self) -> usize {
        self.suit.index() * 13 + (self.rank.value() as usize - 1)
    }

    pub fn from_index(index: usize) -> Option<Card> {
        if index >= DECK_SIZE {
            return None;
        }
        Some(Card::new(ALL_RANKS[index % 13], ALL_SUITS[index / 13]))
    }

    pub fn deadwood(&self) -> u32 {
        self.rank.deadwood()
    }

    pub fn pretty(&self) -> String {
        format!("{}{}", self.rank.to_char(), self.suit.symbol())
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.rank.to_char(), self.suit.to_char())
    }
}

/// All 52 cards in index order.
pub static FULL_DECK: Lazy<Vec<Card>> = Lazy::new(|| {
    (0..DECK_SIZE).filter_map(Card::from_index).collect()
});

/// Order-independent set of cards, one bit per deck index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CardSet(u64);

impl CardSet {
    pub const EMPTY: CardSet = CardSet(0);

    pub fn from_bits(bits: u64) -> CardSet {
        CardSet(bits & ((1u64 << DECK_SIZE) - 1))
    }

    pub fn bits(&self) -> u64 {
        self.0
    }

    pub fn insert(&mut self, card: Card) {
        self.0 |= 1u64 << card.index();
    }

    pub fn remove(&mut self, card: Card) {
        self.0 &= !(1u64 << card.index());
    }

    pub fn with(mut self, card: Card) -> CardSet {
        self.insert(card);
        self
    }

    pub fn without(mut self, card: Card) -> CardSet {
        self.remove(card);
        self
    }

    pub fn contains(&self, card: Card) -> bool {
        self.0 & (1u64 << card.index()) != 0
    }

    pub fn contains_all(&self, other: CardSet) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn difference(&self, other: CardSet) -> CardSet {
        CardSet(self.0 & !other.0)
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Cards in index order.
    pub fn iter(&self) -> impl Iterator<Item = Card> + '_ {
        (0..DECK_SIZE)
            .filter(move |i| self.0 & (1u64 << i) != 0)
            .filter_map(Card::from_index)
    }

    pub fn to_vec(&self) -> Vec<Card> {
        self.iter().collect()
    }
}

impl FromIterator<Card> for CardSet {
    fn from_iter<I: IntoIterator<Item = Card>>(iter: I) -> Self {
        let mut set = CardSet::EMPTY;
        for card in iter {
            set.insert(card);
        }
        set
    }
}

impl fmt::Display for CardSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cards: Vec<String> = self.iter().map(|c| c.to_string()).collect();
        write!(f, "[{}]", cards.join(" "))
    }
}

/// The first `ranks` ranks (ace upward) of the first `suits` suits.
pub fn short_deck(ranks: usize, suits: usize) -> Vec<Card> {
    ALL_SUITS
        .iter()
        .take(suits)
        .flat_map(|&s| ALL_RANKS.iter().take(ranks).map(move |&r| Card::new(r, s)))
        .collect()
}

pub fn parse_card(notation: &str) -> CfrResult<Card> {
    let notation = notation.trim();
    let chars: Vec<char> = notation.chars().collect();
    if chars.len() != 2 {
        return Err(CfrError::InvalidCardNotation(notation.to_string()));
    }
    let rank = Rank::from_char(chars[0].to_ascii_uppercase())?;
    let suit = Suit::from_char(chars[1])?;
    Ok(Card::new(rank, suit))
}

/// Parse a run of card notations, e.g. "As 2h 3h" or "As2h3h".
pub fn parse_cards(notation: &str) -> CfrResult<Vec<Card>> {
    let notation = notation.trim().replace([' ', ','], "");
    if notation.len() % 2 != 0 {
        return Err(CfrError::InvalidCardNotation(notation));
    }
    let chars: Vec<char> = notation.chars().collect();
    chars
        .chunks(2)
        .map(|pair| parse_card(&pair.iter().collect::<String>()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_roundtrip_covers_deck() {
        for i in 0..DECK_SIZE {
            let card = Card::from_index(i).unwrap();
            assert_eq!(card.index(), i);
        }
        assert!(Card::from_index(DECK_SIZE).is_none());
        assert_eq!(FULL_DECK.len(), DECK_SIZE);
    }

    #[test]
    fn card_set_is_order_independent() {
        let a = parse_cards("As 7d Kc").unwrap();
        let b = parse_cards("Kc As 7d").unwrap();
        let sa: CardSet = a.into_iter().collect();
        let sb: CardSet = b.into_iter().collect();
        assert_eq!(sa, sb);
        assert_eq!(sa.len(), 3);
    }

    #[test]
    fn deadwood_caps_face_cards() {
        assert_eq!(parse_card("Ks").unwrap().deadwood(), 10);
        assert_eq!(parse_card("Th").unwrap().deadwood(), 10);
        assert_eq!(parse_card("Ad").unwrap().deadwood(), 1);
    }

    #[test]
    fn short_deck_takes_low_ranks() {
        let deck = short_deck(3, 2);
        assert_eq!(deck.len(), 6);
        assert!(deck.iter().all(|c| c.rank <= Rank::Three));
        assert!(deck.iter().all(|c| c.suit == Suit::Spades || c.suit == Suit::Hearts));
    }
}
