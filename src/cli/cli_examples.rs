use super::cli_main::get_user_input;
use crate::Examples::reduction_examples::reduction_examples;
use crate::Examples::surface_examples::surface_examples;
use std::io::{self, Write};

pub fn examples_menu() {
    loop {
        println!("\n=== Examples ===");
        println!("1. Metal database overview");
        println!("2. Binding energy lookups");
        println!("3. Library save / load round trip");
        println!("4. Tolerance search, default sweep");
        println!("5. Tolerance search, fine sweep");
        println!("0. Back to main menu");
        print!("Enter your choice: ");
        let _ = io::stdout().flush();

        let Some(choice) = get_user_input() else {
            break;
        };
        match choice.trim() {
            "1" => surface_examples(0),
            "2" => surface_examples(1),
            "3" => surface_examples(2),
            "4" => reduction_examples(0),
            "5" => reduction_examples(1),
            "0" => break,
            _ => println!("Invalid choice. Please try again."),
        }
    }
}
