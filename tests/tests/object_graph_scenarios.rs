//! Scenario tests spanning several subjects.

use observation::{Observable, with_observation_tracking};
use observation_integration_tests::{CallCounter, Entity, MiddleNamePerson, Person};
use rstest::rstest;
use std::sync::Arc;

/// Test: a computed property depends on every property it reads
#[rstest]
#[case::first("first")]
#[case::last("last")]
fn test_computed_full_name(#[case] changed: &str) {
	let person = Person::new("Ada", "Lovelace");
	let calls = CallCounter::new();

	let full = with_observation_tracking(|| person.full_name(), calls.callback());
	assert_eq!(full, "Ada Lovelace");

	person.set_age(36);
	assert_eq!(calls.get(), 0);

	match changed {
		"first" => person.set_first_name("Augusta"),
		_ => person.set_last_name("King"),
	}
	assert_eq!(calls.get(), 1);
}

/// Test: the composed base is a separate subject
#[rstest]
fn test_entity_age_is_its_own_subject() {
	let person = Person::new("Ada", "Lovelace");
	let calls = CallCounter::new();

	with_observation_tracking(|| person.age(), calls.callback());

	assert_ne!(person.subject_id(), person.entity().subject_id());
	assert_eq!(person.entity().registrar().interest_count(Entity::AGE), 1);

	person.set_first_name("Augusta");
	assert_eq!(calls.get(), 0);
	person.set_age(37);
	assert_eq!(calls.get(), 1);
}

/// Test: reads across an object graph register on every subject touched
#[rstest]
fn test_friend_graph() {
	let ada = Person::new("Ada", "Lovelace");
	let charles = Arc::new(Person::new("Charles", "Babbage"));
	let mary = Arc::new(Person::new("Mary", "Somerville"));
	ada.add_friend(Arc::clone(&charles));

	let calls = CallCounter::new();
	let names = with_observation_tracking(
		|| {
			ada.friends()
				.iter()
				.map(|friend| friend.first_name())
				.collect::<Vec<_>>()
		},
		calls.callback(),
	);
	assert_eq!(names, vec!["Charles"]);

	// Not read: a friend's last name, an unrelated person.
	charles.set_last_name("B.");
	mary.set_first_name("M.");
	assert_eq!(calls.get(), 0);

	charles.set_first_name("Chuck");
	assert_eq!(calls.get(), 1);

	ada.add_friend(mary);
	assert_eq!(calls.get(), 1);
}

/// Test: changing the friend list fires observers of the list
#[rstest]
fn test_friend_list_change() {
	let ada = Person::new("Ada", "Lovelace");
	let calls = CallCounter::new();

	let count = with_observation_tracking(|| ada.friends().len(), calls.callback());
	assert_eq!(count, 0);

	ada.add_friend(Arc::new(Person::new("Charles", "Babbage")));
	assert_eq!(calls.get(), 1);
}

/// Test: an extended computed property also depends on the added field
#[rstest]
fn test_middle_name_full_name() {
	let person = MiddleNamePerson::new("Augusta", "Ada", "King");
	let calls = CallCounter::new();

	let full = with_observation_tracking(|| person.full_name(), calls.callback());
	assert_eq!(full, "Augusta Ada King");

	person.set_middle_name("A.");
	assert_eq!(calls.get(), 1);

	let again = CallCounter::new();
	with_observation_tracking(|| person.full_name(), again.callback());
	person.person().set_last_name("Lovelace");
	assert_eq!(again.get(), 1);
}
