//! Text generators backed by the `fake` crate.

use super::{SynthContext, Synthesizer};
use fake::faker::address::en::{
    BuildingNumber, CityName, CountryCode, CountryName, StateAbbr, StateName, StreetName, ZipCode,
};
use fake::faker::company::en::{Bs, Buzzword, CompanyName, Industry};
use fake::faker::currency::en::CurrencyCode;
use fake::faker::internet::en::{
    DomainSuffix, IPv4, IPv6, Password, SafeEmail, UserAgent, Username,
};
use fake::faker::lorem::en::{Paragraph, Sentence, Word, Words};
use fake::faker::name::en::{FirstName, LastName, Name};
use fake::faker::phone_number::en::PhoneNumber;
use fake::Fake;
use rand::rngs::StdRng;
use seed_core::Value;

/// Wrap a `fake` faker producing `String` into a registry function.
macro_rules! faker {
    ($faker:expr) => {
        |rng: &mut StdRng, _: &SynthContext| Value::Text($faker.fake_with_rng::<String, _>(rng))
    };
}

pub(super) fn register(synthesizer: &mut Synthesizer) {
    synthesizer.register("name.firstName", faker!(FirstName()));
    synthesizer.register("name.lastName", faker!(LastName()));
    synthesizer.register("name.findName", faker!(Name()));
    synthesizer.register("name.fullName", faker!(Name()));

    synthesizer.register("internet.email", faker!(SafeEmail()));
    synthesizer.register("internet.userName", faker!(Username()));
    synthesizer.register("internet.domainSuffix", faker!(DomainSuffix()));
    synthesizer.register("internet.ip", faker!(IPv4()));
    synthesizer.register("internet.ipv6", faker!(IPv6()));
    synthesizer.register("internet.userAgent", faker!(UserAgent()));
    synthesizer.register("internet.password", faker!(Password(10..16)));
    synthesizer.register("internet.url", |rng, _| Value::Text(url(rng)));

    synthesizer.register("address.city", faker!(CityName()));
    synthesizer.register("address.streetName", faker!(StreetName()));
    synthesizer.register("address.streetAddress", |rng, _| {
        let number: String = BuildingNumber().fake_with_rng(rng);
        let street: String = StreetName().fake_with_rng(rng);
        Value::Text(format!("{number} {street}"))
    });
    synthesizer.register("address.country", faker!(CountryName()));
    synthesizer.register("address.countryCode", faker!(CountryCode()));
    synthesizer.register("address.state", faker!(StateName()));
    synthesizer.register("address.stateAbbr", faker!(StateAbbr()));
    synthesizer.register("address.zipCode", faker!(ZipCode()));

    synthesizer.register("phone.phoneNumber", faker!(PhoneNumber()));

    synthesizer.register("company.companyName", faker!(CompanyName()));
    synthesizer.register("company.industry", faker!(Industry()));
    synthesizer.register("company.buzzword", faker!(Buzzword()));
    synthesizer.register("company.bs", faker!(Bs()));

    synthesizer.register("lorem.word", faker!(Word()));
    synthesizer.register("random.word", faker!(Word()));
    synthesizer.register("lorem.words", |rng, _| Value::Text(words(rng, " ")));
    synthesizer.register("lorem.slug", |rng, _| Value::Text(words(rng, "-")));
    synthesizer.register("lorem.sentence", faker!(Sentence(4..10)));
    synthesizer.register("lorem.paragraph", faker!(Paragraph(2..4)));

    synthesizer.register("commerce.productName", |rng, _| {
        let adjective: String = Buzzword().fake_with_rng(rng);
        let noun: String = Word().fake_with_rng(rng);
        Value::Text(format!("{} {}", capitalize(&adjective), capitalize(&noun)))
    });
    synthesizer.register("commerce.productDescription", faker!(Sentence(8..16)));

    synthesizer.register("finance.currencyCode", faker!(CurrencyCode()));
}

fn url(rng: &mut StdRng) -> String {
    let host: String = Word().fake_with_rng(rng);
    let suffix: String = DomainSuffix().fake_with_rng(rng);
    format!("https://{}.{suffix}", host.to_lowercase())
}

fn words(rng: &mut StdRng, separator: &str) -> String {
    let words: Vec<String> = Words(3..6).fake_with_rng(rng);
    words.join(separator)
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
