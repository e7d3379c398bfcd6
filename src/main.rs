use std::{env, fs::File, path::Path, process};

use classdex_class_file::{attributes::Attribute, ClassFile, ClassFileError, LogObserver};
use memmap::Mmap;

fn main() {
    pretty_env_logger::init();

    let paths = env::args().skip(1).collect::<Vec<_>>();
    if paths.is_empty() {
        eprintln!("usage: classdex <class file>...");
        process::exit(2);
    }

    let mut failed = false;
    for path in &paths {
        if let Err(e) = dump(Path::new(path)) {
            eprintln!("{}: cannot process class file: {}", path, e);
            failed = true;
        }
    }

    if failed {
        process::exit(1);
    }
}

fn dump(path: &Path) -> Result<(), ClassFileError> {
    let file = File::open(path)?;
    let mmap = unsafe { Mmap::map(&file)? };

    let class_file = if log::log_enabled!(log::Level::Trace) {
        ClassFile::parse_with_observer(&mmap, &mut LogObserver::new())?
    } else {
        ClassFile::parse(&mmap)?
    };

    print_class(path, &class_file)
}

fn print_class(path: &Path, class_file: &ClassFile) -> Result<(), ClassFileError> {
    println!("{}:", path.display());
    println!("  class {} (version {})", class_file.class_name()?, class_file.version);
    if let Some(super_class) = class_file.super_class()? {
        println!("  extends {}", super_class);
    }
    for interface in class_file.interfaces()? {
        println!("  implements {}", interface);
    }
    if let Some(source_file) = class_file.source_file() {
        println!("  source {}", source_file);
    }
    print_attributes("  ", class_file.attributes.iter());

    for field in &class_file.fields {
        println!(
            "  field {} {}",
            class_file.field_name(field)?,
            class_file.field_descriptor(field)?
        );
        print_attributes("    ", field.attributes.iter());
    }

    for method in &class_file.methods {
        println!(
            "  method {}{}",
            class_file.method_name(method)?,
            class_file.method_descriptor(method)?
        );
        print_attributes("    ", method.attributes.iter());

        if let Some(code) = method.code() {
            println!(
                "      {} byte(s) of code, {} handler(s)",
                code.code.len(),
                code.exception_table.len()
            );
            print_attributes("      ", code.attributes.iter());
        }
    }

    Ok(())
}

fn print_attributes<'a>(indent: &str, attributes: impl Iterator<Item = &'a Attribute>) {
    for attribute in attributes {
        match attribute {
            Attribute::Unrecognized { name, info } => {
                println!("{}attribute {} ({} raw byte(s))", indent, name, info.len())
            }
            _ => println!("{}attribute {}", indent, attribute.name()),
        }
    }
}
