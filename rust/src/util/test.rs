use similar::ChangeTag;
use similar::TextDiff;
use std::fs::read_dir;
use std::fs::File;
use std::io::Read;

fn read(path: &str) -> Vec<u8> {
  let mut buf = vec![];
  File::open(path).unwrap().read_to_end(&mut buf).unwrap();
  buf
}

/// Runs every `<group>/<name>.js` fixture under `src/<dir_in_src>` through `tester` and compares the result with `<name>.js.out` put through `expected`. The group directory name is passed to `tester`, so groups can select options.
pub fn evaluate_test_input_files<T, E>(dir_in_src: &str, tester: T, expected: E)
where
  T: Fn(&str, Vec<u8>) -> String,
  E: Fn(Vec<u8>) -> String,
{
  let base_dir = format!("{}/src/{}", env!("CARGO_MANIFEST_DIR"), dir_in_src);
  for f_typ in read_dir(&base_dir).unwrap() {
    let f_typ = f_typ.unwrap();
    if !f_typ.file_type().unwrap().is_dir() {
      continue;
    };
    let typ = f_typ.file_name().to_str().unwrap().to_string();
    for f_name in read_dir(format!("{}/{}", base_dir, typ)).unwrap() {
      let name = f_name.unwrap().file_name().to_str().unwrap().to_string();
      if !name.ends_with(".js") {
        continue;
      };
      println!("Testing {}/{}...", typ, name);
      let input = read(&format!("{}/{}/{}", base_dir, typ, name));
      let actual = tester(&typ, input);
      let wanted = expected(read(&format!("{}/{}/{}.out", base_dir, typ, name)));
      if actual != wanted {
        let mut msg = format!("Failed {}/{}, got:\n", typ, name);
        let diff = TextDiff::from_chars(&wanted, &actual);
        for change in diff.iter_all_changes() {
          let sign = match change.tag() {
            ChangeTag::Delete => "-",
            ChangeTag::Insert => "+",
            ChangeTag::Equal => " ",
          };
          msg.push_str(sign);
          msg.push_str(change.as_str().unwrap());
          msg.push('\n');
        }
        panic!("{}", msg);
      };
    }
  }
}
