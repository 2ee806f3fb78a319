//! Prompt text and the structured-output schema sent to the model.
//!
//! The model is asked to answer in Brazilian Portuguese; plan prompts request
//! strict JSON matching [`plan_response_schema`].

use crate::{DailyPlan, Gender, UserProfile};
use serde_json::{Value, json};

pub fn plan_prompt(profile: &UserProfile, previous: Option<&DailyPlan>, today: &str) -> String {
    let variety = previous.map(variety_constraint).unwrap_or_default();
    format!(
        "Atue como um nutricionista e personal trainer profissional brasileiro.
Hoje é {today}.
Gere um cardápio de 1 dia e um treino personalizado para um usuário com o seguinte perfil:
- Idade: {age}
- Gênero: {gender}
- Altura: {height}cm
- Peso Atual: {current}kg
- Peso Meta: {target}kg
- Objetivo: {goal}
- Nível de Atividade: {activity}
- Localização/Região: {region} (IMPORTANTE: Sugira refeições usando ingredientes comuns e acessíveis nesta região).
- Restrições Alimentares: {restrictions}
- Preferências: {preferences}

CONTEXTO DE VARIEDADE:
{variety}

Instruções:
1. Defina horários realistas para cada refeição (Ex: 08:00, 12:30, 16:00, 20:00).
2. Calcule o déficit ou superávit calórico necessário com base no objetivo.
3. Crie refeições para: Café da Manhã, Almoço, Lanche da Tarde e Jantar.
4. Crie uma lista de compras consolidada para essas refeições.
5. Crie uma sugestão de treino para o dia.
6. Forneça 3 dicas de saúde.
7. Forneça uma frase motivacional.

IDIOMA DE SAÍDA: Português do Brasil (PT-BR).
IMPORTANTE: A resposta deve ser estritamente um JSON válido seguindo o esquema fornecido.",
        age = profile.age,
        gender = gender_label(profile.gender),
        height = profile.height,
        current = profile.current_weight,
        target = profile.target_weight,
        goal = profile.goal.label(),
        activity = profile.activity_level.label(),
        region = profile.region,
        restrictions = or_none(&profile.restrictions),
        preferences = or_none(&profile.preferences),
    )
}

fn variety_constraint(previous: &DailyPlan) -> String {
    format!(
        "EVITE REPETIR EXATAMENTE AS MESMAS REFEIÇÕES DE ONTEM.
Refeições anteriores para evitar:
- Café: {}
- Almoço: {}
- Jantar: {}
VARIE O TREINO TAMBÉM. Treino anterior: {}",
        previous.meals.breakfast.name,
        previous.meals.lunch.name,
        previous.meals.dinner.name,
        previous.workout.kind,
    )
}

pub fn chat_prompt(profile: &UserProfile, plan: Option<&DailyPlan>, question: &str) -> String {
    let addressee = match profile.gender {
        Gender::Male => "Usuário",
        _ => "Usuária",
    };
    let diet = match plan {
        Some(p) => format!(
            "Usuário tem um plano gerado para hoje com {} calorias.",
            p.total_calories
        ),
        None => "Usuário ainda não gerou o plano de hoje.".to_string(),
    };
    format!(
        "Atue como um nutricionista amigável e brasileiro.

CONTEXTO DO USUÁRIO:
- Nome: {addressee}
- Objetivo: {goal}
- Dieta atual: {diet}

PERGUNTA DO USUÁRIO:
\"{question}\"

Responda de forma direta, útil e curta (máximo 3 frases).
Responda SEMPRE em Português do Brasil.",
        goal = profile.goal.label(),
    )
}

fn gender_label(gender: Gender) -> &'static str {
    match gender {
        Gender::Male => "male",
        Gender::Female => "female",
        Gender::Other => "other",
    }
}

fn or_none(s: &str) -> &str {
    if s.trim().is_empty() { "Nenhuma" } else { s }
}

fn ingredient_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "item": { "type": "STRING" },
            "amount": { "type": "STRING" }
        }
    })
}

fn meal_schema(example_time: &str) -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "time": { "type": "STRING", "description": format!("Horário sugerido (ex: {example_time})") },
            "name": { "type": "STRING" },
            "description": { "type": "STRING" },
            "calories": { "type": "NUMBER" },
            "protein": { "type": "NUMBER" },
            "carbs": { "type": "NUMBER" },
            "fats": { "type": "NUMBER" },
            "preparationTime": { "type": "STRING" },
            "ingredients": { "type": "ARRAY", "items": ingredient_schema() }
        },
        "required": ["time", "name", "calories", "ingredients"]
    })
}

/// Structured-output schema for a [`DailyPlan`], in the Gemini `responseSchema` dialect.
pub fn plan_response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "date": { "type": "STRING", "description": "A data de hoje formatada (ex: Segunda-feira, 24 de Outubro)" },
            "motivationalQuote": { "type": "STRING", "description": "Uma frase motivacional curta" },
            "totalCalories": { "type": "NUMBER" },
            "macroTargets": {
                "type": "OBJECT",
                "properties": {
                    "protein": { "type": "NUMBER" },
                    "carbs": { "type": "NUMBER" },
                    "fats": { "type": "NUMBER" }
                },
                "required": ["protein", "carbs", "fats"]
            },
            "meals": {
                "type": "OBJECT",
                "properties": {
                    "breakfast": meal_schema("07:30"),
                    "lunch": meal_schema("12:30"),
                    "snack": meal_schema("16:00"),
                    "dinner": meal_schema("20:00")
                },
                "required": ["breakfast", "lunch", "snack", "dinner"]
            },
            "shoppingList": { "type": "ARRAY", "items": ingredient_schema() },
            "workout": {
                "type": "OBJECT",
                "properties": {
                    "type": { "type": "STRING" },
                    "duration": { "type": "STRING" },
                    "exercises": {
                        "type": "ARRAY",
                        "items": {
                            "type": "OBJECT",
                            "properties": {
                                "name": { "type": "STRING" },
                                "sets": { "type": "STRING" },
                                "reps": { "type": "STRING" },
                                "instructions": { "type": "STRING" }
                            }
                        }
                    }
                }
            },
            "tips": { "type": "ARRAY", "items": { "type": "STRING" } }
        },
        "required": ["date", "motivationalQuote", "totalCalories", "macroTargets", "meals", "shoppingList", "workout", "tips"]
    })
}
