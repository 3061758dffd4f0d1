//! Teaching tool: explanations, examples and analogies for core Python concepts.

use async_trait::async_trait;
use learncoach_core::error::ToolError;
use learncoach_core::tool::Tool;
use serde::Deserialize;

use crate::parse_args;

struct Material {
    topic: &'static str,
    explanation: &'static str,
    examples: &'static [&'static str],
    analogy: &'static str,
    common_mistakes: &'static [&'static str],
    practice_exercise: &'static str,
}

static MATERIALS: [Material; 7] = [
    Material {
        topic: "variables",
        explanation: "Variables are like containers that store data values. In Python, you create a variable by assigning a value to a name.",
        examples: &[
            "name = 'Alice'  # String variable",
            "age = 25       # Integer variable",
            "height = 5.9   # Float variable",
            "is_student = True  # Boolean variable",
        ],
        analogy: "Think of variables like labeled boxes - the label is the variable name, and what's inside is the value.",
        common_mistakes: &[
            "Forgetting to initialize variables",
            "Using reserved keywords as names",
            "Case sensitivity issues",
        ],
        practice_exercise: "Create variables for your name, age, and favorite color, then print them.",
    },
    Material {
        topic: "functions",
        explanation: "Functions are reusable blocks of code that perform specific tasks. They help organize code and avoid repetition.",
        examples: &[
            "def greet(name):\n    return f'Hello, {name}!'\n\nprint(greet('Alice'))",
            "def add_numbers(a, b):\n    return a + b\n\nresult = add_numbers(5, 3)\nprint(result)  # Output: 8",
        ],
        analogy: "Functions are like kitchen appliances - you give them ingredients (parameters), they do the work, and give you back the result.",
        common_mistakes: &[
            "Forgetting return statements",
            "Confusing parameters and arguments",
            "Not handling edge cases",
        ],
        practice_exercise: "Create a function that calculates the area of a rectangle given length and width.",
    },
    Material {
        topic: "loops",
        explanation: "Loops let you execute a block of code repeatedly. Python has 'for' loops for iterating over sequences and 'while' loops for repeating while a condition is true.",
        examples: &[
            "# For loop\nfruits = ['apple', 'banana', 'cherry']\nfor fruit in fruits:\n    print(fruit)",
            "# While loop\ncount = 1\nwhile count <= 5:\n    print(count)\n    count += 1",
        ],
        analogy: "Loops are like assembly lines - they repeatedly perform the same action on different items.",
        common_mistakes: &[
            "Infinite while loops",
            "Modifying the list being iterated",
            "Off-by-one errors",
        ],
        practice_exercise: "Write a loop that prints even numbers from 2 to 20.",
    },
    Material {
        topic: "lists",
        explanation: "Lists are ordered, mutable collections of items. They can contain different data types and are very versatile.",
        examples: &[
            "# Creating lists\nnumbers = [1, 2, 3, 4, 5]\nnames = ['Alice', 'Bob', 'Charlie']\nmixed = [1, 'hello', True, 3.14]",
            "# List operations\nfruits = ['apple', 'banana']\nfruits.append('cherry')  # Add item\nfruits.remove('apple')   # Remove item\nprint(fruits[0])         # Access item",
        ],
        analogy: "Lists are like train cars - each car holds something, and they're connected in order.",
        common_mistakes: &[
            "Index errors",
            "Confusing append() with extend()",
            "Not understanding mutability",
        ],
        practice_exercise: "Create a list of 5 numbers, then add, remove, and access elements.",
    },
    Material {
        topic: "dictionaries",
        explanation: "Dictionaries store key-value pairs. They're mutable and very fast for lookups.",
        examples: &[
            "# Creating dictionaries\nstudent = {'name': 'Alice', 'age': 20, 'grade': 'A'}\n\n# Accessing values\nprint(student['name'])  # Output: Alice\n\n# Adding new key-value\nstudent['city'] = 'Boston'",
        ],
        analogy: "Dictionaries are like real dictionaries - you look up a word (key) to find its definition (value).",
        common_mistakes: &[
            "Key errors when accessing non-existent keys",
            "Using unhashable types as keys",
            "Forgetting .get() method",
        ],
        practice_exercise: "Create a dictionary for a book with title, author, and year, then add the genre.",
    },
    Material {
        topic: "classes",
        explanation: "Classes are blueprints for creating objects. They bundle data (attributes) and functionality (methods) together.",
        examples: &[
            "class Dog:\n    def __init__(self, name, age):\n        self.name = name\n        self.age = age\n\n    def bark(self):\n        return f'{self.name} says woof!'\n\nmy_dog = Dog('Buddy', 3)\nprint(my_dog.bark())",
        ],
        analogy: "Classes are like cookie cutters - the class is the cutter, and objects are the cookies made from it.",
        common_mistakes: &[
            "Forgetting self parameter",
            "Not understanding __init__",
            "Confusing class vs instance variables",
        ],
        practice_exercise: "Create a Car class with make, model, and year attributes, plus a method to display info.",
    },
    Material {
        topic: "conditionals",
        explanation: "Conditionals allow your code to make decisions based on conditions. Use if, elif, and else statements.",
        examples: &[
            "age = 18\nif age >= 18:\n    print('Adult')\nelse:\n    print('Minor')",
            "score = 85\nif score >= 90:\n    grade = 'A'\nelif score >= 80:\n    grade = 'B'\nelse:\n    grade = 'C'\nprint(f'Grade: {grade}')",
        ],
        analogy: "Conditionals are like traffic lights - different paths are taken based on the signal (condition).",
        common_mistakes: &[
            "Using = instead of ==",
            "Incorrect indentation",
            "Logic errors in conditions",
        ],
        practice_exercise: "Write code that checks if a number is positive, negative, or zero.",
    },
];

const LEVEL_GUIDANCE: [(&str, &str); 3] = [
    (
        "beginner",
        "We'll start with the basics and build up slowly. Don't worry if it takes time to understand.",
    ),
    ("intermediate", "Let's dive deeper into the concepts and practical applications."),
    ("advanced", "We'll explore advanced usage patterns, edge cases, and best practices."),
];

const STYLE_SUGGESTIONS: [(&str, &str); 4] = [
    ("visual", "I recommend drawing diagrams or flowcharts to visualize how this works."),
    ("auditory", "Read the examples out loud and explain them to yourself or someone else."),
    ("kinesthetic", "Type out all the examples yourself and experiment with variations."),
    ("adaptive", "Try multiple approaches - read, write, and discuss to see what works best."),
];

/// Look `key` up in a pair table, falling back to `fallback`'s entry.
fn lookup(table: &[(&'static str, &'static str)], key: &str, fallback: &str) -> &'static str {
    table
        .iter()
        .find(|(k, _)| *k == key)
        .or_else(|| table.iter().find(|(k, _)| *k == fallback))
        .map(|(_, v)| *v)
        .unwrap_or_default()
}

/// Topics with hand-written material.
pub fn known_topics() -> impl Iterator<Item = &'static str> {
    MATERIALS.iter().map(|m| m.topic)
}

fn default_level() -> String {
    "beginner".into()
}
fn default_style() -> String {
    "adaptive".into()
}

#[derive(Debug, Deserialize)]
struct TeachArgs {
    topic: String,
    #[serde(default = "default_level")]
    level: String,
    #[serde(default = "default_style")]
    learning_style: String,
}

pub struct TeachConceptTool;

#[async_trait]
impl Tool for TeachConceptTool {
    fn name(&self) -> &str {
        "teach_python_concept"
    }

    fn description(&self) -> &str {
        "Get a lesson on a Python concept: explanation, code examples, analogy, common mistakes and a practice exercise."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "topic": { "type": "string", "description": "The concept, e.g. loops or classes" },
                "level": { "type": "string", "default": "beginner" },
                "learning_style": { "type": "string", "default": "adaptive" }
            },
            "required": ["topic"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        let args: TeachArgs = parse_args(self.name(), arguments)?;
        let topic = &args.topic;
        let key = topic.to_lowercase();

        let material = MATERIALS.iter().find(|m| m.topic == key);
        let (explanation, examples, analogy, mistakes, exercise) = match material {
            Some(m) => (
                m.explanation.to_string(),
                m.examples.iter().map(|s| s.to_string()).collect::<Vec<_>>(),
                m.analogy.to_string(),
                m.common_mistakes.iter().map(|s| s.to_string()).collect::<Vec<_>>(),
                m.practice_exercise.to_string(),
            ),
            None => (
                format!(
                    "Let me explain {topic} in Python. This is a fundamental concept in programming."
                ),
                vec![format!(
                    "# Example of {topic}\n# Code will be demonstrated based on the concept"
                )],
                format!("Think of {topic} as a tool in your programming toolbox."),
                vec![format!("Be careful with {topic} syntax"), "Practice regularly".to_string()],
                format!("Try implementing {topic} in a simple program"),
            ),
        };

        Ok(serde_json::json!({
            "topic": topic,
            "level": args.level,
            "learning_style": args.learning_style,
            "explanation": explanation,
            "code_examples": examples,
            "real_world_analogy": analogy,
            "common_mistakes": mistakes,
            "practice_exercise": exercise,
            "level_guidance": lookup(&LEVEL_GUIDANCE, &args.level, "beginner"),
            "style_suggestion": lookup(&STYLE_SUGGESTIONS, &args.learning_style, "adaptive"),
            "next_steps": format!(
                "After mastering {topic}, you'll be ready for more advanced concepts."
            ),
            "key_takeaways": [
                format!("Understand the purpose and syntax of {topic}"),
                "Practice with the provided examples",
                "Avoid the common mistakes mentioned",
                "Apply this concept in your own projects",
            ],
            "additional_resources": [
                format!("Python documentation on {topic}"),
                format!("Interactive {topic} tutorials online"),
                format!("Practice {topic} on coding platforms"),
            ],
        }))
    }
}
