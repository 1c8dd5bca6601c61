//! Seed content: the full category list and the learning items shipped
//! with the app.

use crate::types::{Category, NewLearningItem};

pub fn categories() -> Vec<Category> {
    let defs: &[(&str, &str, &str, &str)] = &[
        ("fruits", "Fruits", "🍎", "Learn about delicious and healthy fruits"),
        ("vegetables", "Vegetables", "🥕", "Discover nutritious vegetables"),
        ("animals", "Animals", "🐶", "Meet amazing animals from around the world"),
        ("alphabet", "Alphabet", "📚", "Learn letters from A to Z"),
        ("colors", "Colors", "🌈", "Explore the vibrant world of colors"),
        ("shapes", "Shapes", "🔷", "Discover different shapes and forms"),
        ("numbers", "Numbers", "🔢", "Count and learn numbers 1 through 10"),
        ("transportation", "Transportation", "🚗", "Learn about vehicles and ways to travel"),
    ];
    defs.iter()
        .map(|&(id, name, emoji, description)| Category {
            id: id.to_string(),
            name: name.to_string(),
            emoji: emoji.to_string(),
            description: description.to_string(),
        })
        .collect()
}

pub fn items() -> Vec<NewLearningItem> {
    let defs: &[(&str, &str, &str, &str)] = &[
        // Fruits
        ("Apple", "fruits", "🍎", "Apples float in water because they are 25% air!"),
        ("Banana", "fruits", "🍌", "Bananas are berries, but strawberries are not!"),
        ("Orange", "fruits", "🍊", "Oranges are full of vitamin C which keeps you healthy!"),
        ("Grape", "fruits", "🍇", "Grapes grow in bunches on vines!"),
        ("Strawberry", "fruits", "🍓", "Strawberries are the only fruit with seeds on the outside!"),
        ("Watermelon", "fruits", "🍉", "Watermelons are 92% water!"),
        // Vegetables
        ("Carrot", "vegetables", "🥕", "Carrots help your eyes see better in the dark!"),
        ("Broccoli", "vegetables", "🥦", "Broccoli looks like tiny trees!"),
        ("Tomato", "vegetables", "🍅", "Tomatoes are actually fruits, not vegetables!"),
        ("Corn", "vegetables", "🌽", "Each ear of corn has about 800 kernels!"),
        ("Pepper", "vegetables", "🫑", "Bell peppers can be red, yellow, green, or purple!"),
        ("Potato", "vegetables", "🥔", "Potatoes were the first vegetable grown in space!"),
        // Animals
        ("Dog", "animals", "🐶", "Dogs have an amazing sense of smell, much better than humans!"),
        ("Cat", "animals", "🐱", "Cats can make over 100 different sounds!"),
        ("Elephant", "animals", "🐘", "Elephants are the largest animals that live on land!"),
        ("Bird", "animals", "🐦", "Birds are the only animals with feathers!"),
        ("Fish", "animals", "🐠", "Fish breathe underwater using gills instead of lungs!"),
        ("Lion", "animals", "🦁", "Lions live in groups called prides!"),
        // Alphabet
        ("A", "alphabet", "🍎", "A is for Apple! The first letter of the alphabet."),
        ("B", "alphabet", "🐻", "B is for Bear! Bears love to eat honey."),
        ("C", "alphabet", "🐱", "C is for Cat! Cats are great pets."),
        ("D", "alphabet", "🐶", "D is for Dog! Dogs are loyal friends."),
        ("E", "alphabet", "🐘", "E is for Elephant! Elephants never forget."),
        ("F", "alphabet", "🐸", "F is for Frog! Frogs can jump very high!"),
    ];
    defs.iter()
        .map(|&(name, category, emoji, fact)| NewLearningItem {
            name: name.to_string(),
            category: category.to_string(),
            emoji: emoji.to_string(),
            fact: fact.to_string(),
        })
        .collect()
}
