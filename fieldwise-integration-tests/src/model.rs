//! Domain types and their data transfer counterparts shared by the tests.
use std::{cell::OnceCell, fmt, rc::Rc};

use fieldwise::Introspect;
use indexmap::IndexMap;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Introspect)]
pub struct Person {
    pub name: String,
    pub age: u32,
    pub partner: Option<String>,
    pub home: Home,
    pub nicknames: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Introspect)]
pub struct Home {
    pub address: Address,
    pub owned: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Introspect)]
pub struct Address {
    pub number: u32,
    pub street: String,
}

#[derive(Debug, Clone, Introspect)]
pub struct PersonDto {
    pub name: &'static str,
    pub age: u64,
    pub partner: Option<&'static str>,
    pub home: HomeDto,
    pub nicknames: Vec<&'static str>,
}

#[derive(Debug, Clone, Introspect)]
pub struct HomeDto {
    pub address: AddressDto,
    pub owned: bool,
}

#[derive(Debug, Clone, Introspect)]
pub struct AddressDto {
    pub number: i64,
    pub street: &'static str,
}

pub fn person(name: &str, age: u32) -> Person {
    Person {
        name: name.to_string(),
        age,
        partner: None,
        home: Home {
            address: Address {
                number: 2311,
                street: "North Los Robles Avenue".to_string(),
            },
            owned: false,
        },
        nicknames: Vec::new(),
    }
}

pub fn sheldon() -> Person {
    Person {
        nicknames: vec!["Shelly".to_string(), "Moon Pie".to_string()],
        ..person("Sheldon", 30)
    }
}

pub fn leonard() -> Person {
    Person {
        partner: Some("Penny".to_string()),
        ..person("Leonard", 31)
    }
}

pub fn sheldon_dto() -> PersonDto {
    PersonDto {
        name: "Sheldon",
        age: 30,
        partner: None,
        home: HomeDto {
            address: AddressDto {
                number: 2311,
                street: "North Los Robles Avenue",
            },
            owned: false,
        },
        nicknames: vec!["Shelly", "Moon Pie"],
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Introspect)]
pub enum Genre {
    Fiction,
    Physics,
    #[introspect(rename = "comics")]
    Comics,
}

#[derive(Debug, Clone, Introspect)]
pub struct Book {
    pub title: String,
    pub genre: Genre,
    #[introspect(skip)]
    pub checked_out: u32,
}

pub fn book(title: &str, genre: Genre) -> Book {
    Book {
        title: title.to_string(),
        genre,
        checked_out: 0,
    }
}

/// Books keyed by shelf label, in insertion order.
#[derive(Debug, Clone, Introspect)]
pub struct Library {
    pub owner: String,
    pub shelves: IndexMap<String, Vec<Book>>,
}

/// Roommates point at each other, forming a reference cycle.
#[derive(Introspect)]
pub struct Roommate {
    pub name: String,
    pub roommate: OnceCell<Rc<Roommate>>,
}

// Debug would never terminate on the cycle.
impl fmt::Debug for Roommate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Roommate({})", self.name)
    }
}

/// Two roommates sharing an apartment; the first one is returned.
pub fn apartment(first: &str, second: &str) -> Rc<Roommate> {
    let first = Rc::new(Roommate {
        name: first.to_string(),
        roommate: OnceCell::new(),
    });
    let second = Rc::new(Roommate {
        name: second.to_string(),
        roommate: OnceCell::new(),
    });
    let _ = first.roommate.set(Rc::clone(&second));
    let _ = second.roommate.set(Rc::clone(&first));
    first
}
