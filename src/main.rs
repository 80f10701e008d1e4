use std::{env, process::ExitCode};

use javad_class_file::ClassFile;

const DELIMITER: &str = "====================================================";

fn main() -> ExitCode {
    pretty_env_logger::init();

    let paths = env::args().skip(1).collect::<Vec<_>>();
    if paths.is_empty() {
        eprintln!("this program takes a set of one or more .class file names as its argument");
        return ExitCode::FAILURE;
    }

    let mut failed = false;
    for (i, path) in paths.iter().enumerate() {
        if i > 0 {
            print!("\n\n{DELIMITER}\n\n");
        }

        println!("Dumping \"{path}\"");
        match ClassFile::open(path) {
            Ok(class_file) => print_class_file(&class_file),
            Err(e) => {
                log::error!("{path}: {e}");
                failed = true;
            }
        }
    }

    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn print_class_file(class_file: &ClassFile) {
    println!("Class Modifiers: {}", class_file.modifiers());
    println!("Class Name: {}", class_file.class_name());
    println!(
        "Class Superclass: {}",
        class_file.super_class().unwrap_or("none")
    );

    for interface in class_file.interfaces() {
        println!("Interface: {interface}");
    }
    for field in class_file.field_descriptions() {
        println!("Field: {field}");
    }
    for method in class_file.method_descriptions() {
        println!("Method: {method}");
    }
    for constructor in class_file.constructor_descriptions() {
        println!("Constructor: {constructor}");
    }

    println!();
    print!("{class_file}");
}
